//! Per-channel sensor → indicator state machine.
//!
//! ```text
//!            active sample                    inactive sample
//!   ┌────────────────────────────┐   ┌──────────────────────────────┐
//!   │ indicator ON, timer → Idle │   │ timer → Armed { now + quiet } │
//!   └────────────────────────────┘   └──────────────┬───────────────┘
//!                                                   │ fire, now >= deadline
//!                                                   ▼
//!                                    ┌──────────────────────────────┐
//!                                    │ indicator OFF, timer → Idle   │
//!                                    └──────────────────────────────┘
//! ```
//!
//! [`Channel::on_edge`] runs in interrupt context, [`Channel::on_timer_fired`]
//! in the timer task.  Both run their read-decide-write sequence inside the
//! channel's own critical section, and neither holds it across a
//! [`TimerService`] call.
//!
//! The armed state carries its deadline.  A fire that enters the section and
//! finds the timer idle (cancelled) or armed for a later deadline (re-armed)
//! is stale and changes nothing, so a cancel or re-arm always wins over a
//! fire that has not entered the section yet.  A fire that already entered
//! runs to completion; the next active edge then turns the indicator back on.

use core::cell::RefCell;
use core::time::Duration;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::events::ChannelEvent;
use crate::app::ports::{DiagnosticSink, TimerService};
use crate::config::{ChannelConfig, ChannelMode};
use crate::error::Primitive;

/// Sensor level after polarity mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Active,
    Inactive,
}

/// Deferred-off timer as seen by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffTimer {
    Idle,
    /// Will turn the indicator off once the clock reaches `deadline_ms`.
    Armed { deadline_ms: u64 },
}

impl OffTimer {
    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed { .. })
    }
}

/// Per-channel counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Active samples that drove the indicator on (or toggled it).
    pub activations: u32,
    /// Quiet periods that elapsed and turned the indicator off.
    pub timed_offs: u32,
    /// Timer fires ignored because the arm was cancelled or superseded.
    pub stale_fires: u32,
    /// Runtime primitive failures.
    pub faults: u32,
}

/// Point-in-time copy of a channel's state, readable from any context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub index: u8,
    pub mode: ChannelMode,
    pub output_on: bool,
    pub timer: OffTimer,
    pub stats: ChannelStats,
}

/// Mutable channel state, only ever touched inside the critical section.
struct Lines<I, O> {
    sensor: I,
    output: O,
    output_on: bool,
    timer: OffTimer,
    stats: ChannelStats,
}

impl<I: InputPin, O: OutputPin> Lines<I, O> {
    fn sample(&mut self, active_high: bool) -> Result<Level, ()> {
        let high = self.sensor.is_high().map_err(|_| ())?;
        Ok(if high == active_high {
            Level::Active
        } else {
            Level::Inactive
        })
    }

    fn drive(&mut self, on: bool) -> Result<(), ()> {
        let res = if on {
            self.output.set_high()
        } else {
            self.output.set_low()
        };
        res.map_err(|_| ())?;
        self.output_on = on;
        Ok(())
    }
}

/// Timer-service call decided inside the section, made after leaving it.
enum TimerCall {
    None,
    Cancel,
    Schedule { deadline_ms: u64 },
}

/// One sensor/indicator pairing with its deferred-off timer.
pub struct Channel<I, O> {
    index: u8,
    mode: ChannelMode,
    sensor_active_high: bool,
    quiet_period_ms: u32,
    lines: Mutex<CriticalSectionRawMutex, RefCell<Lines<I, O>>>,
}

impl<I: InputPin, O: OutputPin> Channel<I, O> {
    /// `output` must already be driven off by the wiring step.
    pub fn new(index: u8, pins: &ChannelConfig, quiet_period_ms: u32, sensor: I, output: O) -> Self {
        Self {
            index,
            mode: pins.mode,
            sensor_active_high: pins.sensor_active_high,
            quiet_period_ms,
            lines: Mutex::new(RefCell::new(Lines {
                sensor,
                output,
                output_on: false,
                timer: OffTimer::Idle,
                stats: ChannelStats::default(),
            })),
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    /// Edge interrupt handler.  Re-samples the sensor rather than trusting
    /// the edge direction.
    pub fn on_edge<T: TimerService, D: DiagnosticSink>(&self, timer: &T, sink: &D) {
        let now_ms = timer.now_ms();
        let (call, event) = self
            .lines
            .lock(|cell| self.decide(&mut cell.borrow_mut(), now_ms));

        if let Some(event) = event {
            sink.emit(event);
        }

        match call {
            TimerCall::None => {}
            TimerCall::Cancel => {
                // Already Idle in our state, so a late fire is ignored even
                // when the driver refuses the cancel.
                if timer.cancel(self.index).is_err() {
                    self.record_fault(Primitive::CancelTimer, sink);
                }
            }
            TimerCall::Schedule { deadline_ms } => {
                let delay = Duration::from_millis(u64::from(self.quiet_period_ms));
                if timer.schedule_once(self.index, delay).is_err() {
                    // Nothing will fire: drop our arm unless a newer one replaced it.
                    self.lines.lock(|cell| {
                        let mut lines = cell.borrow_mut();
                        if lines.timer == (OffTimer::Armed { deadline_ms }) {
                            lines.timer = OffTimer::Idle;
                        }
                    });
                    self.record_fault(Primitive::ArmTimer, sink);
                }
            }
        }
    }

    /// Deferred-off callback.  Never reads the sensor.
    pub fn on_timer_fired<T: TimerService, D: DiagnosticSink>(&self, timer: &T, sink: &D) {
        let now_ms = timer.now_ms();
        let event = self.lines.lock(|cell| {
            let mut lines = cell.borrow_mut();
            match lines.timer {
                OffTimer::Armed { deadline_ms } if now_ms >= deadline_ms => {
                    lines.timer = OffTimer::Idle;
                    if lines.drive(false).is_err() {
                        lines.stats.faults += 1;
                        return self.fault(Primitive::SetLevel);
                    }
                    lines.stats.timed_offs += 1;
                    ChannelEvent::TimedOff {
                        channel: self.index,
                    }
                }
                _ => {
                    lines.stats.stale_fires += 1;
                    ChannelEvent::StaleFire {
                        channel: self.index,
                    }
                }
            }
        });
        sink.emit(event);
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        self.lines.lock(|cell| {
            let lines = cell.borrow();
            ChannelSnapshot {
                index: self.index,
                mode: self.mode,
                output_on: lines.output_on,
                timer: lines.timer,
                stats: lines.stats,
            }
        })
    }

    pub fn output_is_on(&self) -> bool {
        self.lines.lock(|cell| cell.borrow().output_on)
    }

    fn decide(&self, lines: &mut Lines<I, O>, now_ms: u64) -> (TimerCall, Option<ChannelEvent>) {
        let Ok(level) = lines.sample(self.sensor_active_high) else {
            lines.stats.faults += 1;
            return (TimerCall::None, Some(self.fault(Primitive::ReadLevel)));
        };

        match (self.mode, level) {
            (ChannelMode::Timed, Level::Active) => {
                // Activity cancels a pending off even when the write fails.
                let cancelled_off = lines.timer.is_armed();
                lines.timer = OffTimer::Idle;
                if lines.drive(true).is_err() {
                    lines.stats.faults += 1;
                    return (TimerCall::Cancel, Some(self.fault(Primitive::SetLevel)));
                }
                lines.stats.activations += 1;
                (
                    TimerCall::Cancel,
                    Some(ChannelEvent::Activated {
                        channel: self.index,
                        cancelled_off,
                    }),
                )
            }
            (ChannelMode::Timed, Level::Inactive) => {
                let rearmed = lines.timer.is_armed();
                let deadline_ms = now_ms + u64::from(self.quiet_period_ms);
                lines.timer = OffTimer::Armed { deadline_ms };
                (
                    TimerCall::Schedule { deadline_ms },
                    Some(ChannelEvent::OffScheduled {
                        channel: self.index,
                        delay_ms: self.quiet_period_ms,
                        rearmed,
                    }),
                )
            }
            (ChannelMode::Toggle, Level::Active) => {
                let on = !lines.output_on;
                if lines.drive(on).is_err() {
                    lines.stats.faults += 1;
                    return (TimerCall::None, Some(self.fault(Primitive::SetLevel)));
                }
                lines.stats.activations += 1;
                (
                    TimerCall::None,
                    Some(ChannelEvent::Toggled {
                        channel: self.index,
                        on,
                    }),
                )
            }
            (ChannelMode::Toggle, Level::Inactive) => (TimerCall::None, None),
        }
    }

    fn record_fault<D: DiagnosticSink>(&self, primitive: Primitive, sink: &D) {
        self.lines.lock(|cell| cell.borrow_mut().stats.faults += 1);
        sink.emit(self.fault(primitive));
    }

    fn fault(&self, primitive: Primitive) -> ChannelEvent {
        ChannelEvent::Fault {
            channel: self.index,
            primitive,
        }
    }
}
