//! Host-side simulation adapters.
//!
//! Stand-ins for the ESP-IDF GPIO and esp_timer adapters so the channel
//! core, the registry, and the controller can be driven on x86_64 with no
//! hardware:
//!
//! - [`SimLine`] — a shared digital line usable as sensor or indicator,
//!   with failure injection.
//! - [`ManualTimer`] — a [`TimerService`] on a virtual clock.  Nothing
//!   fires by itself; [`Controller::advance_to`] delivers due fires in
//!   deadline order.
//! - [`SimWiring`] — a [`LineWiring`] over pre-built `SimLine` pairs.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use core::time::Duration;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::app::controller::Controller;
use crate::app::ports::{DiagnosticSink, LineWiring, TimerService};
use crate::config::{ChannelConfig, MAX_CHANNELS};
use crate::error::{TimerError, WiringError, WiringStep};

// ── SimLine ───────────────────────────────────────────────────

#[derive(Debug, Default)]
struct LineState {
    high: AtomicBool,
    failing: AtomicBool,
    writes: AtomicU32,
}

/// Shared simulated GPIO line.  Clones observe the same level.
#[derive(Debug, Clone, Default)]
pub struct SimLine {
    state: Arc<LineState>,
}

/// Error reported by a [`SimLine`] with failure injection enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimLineError;

impl digital::Error for SimLineError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl SimLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the line from the outside (the "sensor" side of the wire).
    pub fn drive(&self, high: bool) {
        self.state.high.store(high, Ordering::SeqCst);
    }

    /// Current level, without going through the HAL traits.
    pub fn level(&self) -> bool {
        self.state.high.load(Ordering::SeqCst)
    }

    /// Number of successful HAL writes.
    pub fn writes(&self) -> u32 {
        self.state.writes.load(Ordering::SeqCst)
    }

    /// Make every HAL read/write fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), SimLineError> {
        if self.state.failing.load(Ordering::SeqCst) {
            Err(SimLineError)
        } else {
            Ok(())
        }
    }

    fn write(&self, high: bool) -> Result<(), SimLineError> {
        self.check()?;
        self.state.high.store(high, Ordering::SeqCst);
        self.state.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ErrorType for SimLine {
    type Error = SimLineError;
}

impl InputPin for SimLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

// ── ManualTimer ───────────────────────────────────────────────

/// Virtual-clock timer service.  Arming replaces the channel's pending
/// deadline, matching esp_timer restart semantics.
#[derive(Debug, Default)]
pub struct ManualTimer {
    now_ms: AtomicU64,
    pending: Mutex<[Option<u64>; MAX_CHANNELS]>,
    failing: AtomicBool,
    arm_calls: AtomicU32,
    cancel_calls: AtomicU32,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_now(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Pending deadline for `channel`, if armed.
    pub fn pending(&self, channel: u8) -> Option<u64> {
        self.slots().get(channel as usize).copied().flatten()
    }

    /// Take the earliest deadline at or before `until_ms`, move the clock
    /// to it, and return its channel.
    pub fn pop_due(&self, until_ms: u64) -> Option<u8> {
        let mut slots = self.slots();
        let (channel, deadline) = slots
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.map(|d| (i, d)))
            .filter(|&(_, d)| d <= until_ms)
            .min_by_key(|&(i, d)| (d, i))?;
        slots[channel] = None;
        drop(slots);
        self.now_ms.fetch_max(deadline, Ordering::SeqCst);
        Some(channel as u8)
    }

    /// Make schedule and cancel calls fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn arm_calls(&self) -> u32 {
        self.arm_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> u32 {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, [Option<u64>; MAX_CHANNELS]> {
        // A panicking test thread must not wedge the others.
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check(&self, channel: u8) -> Result<(), TimerError> {
        if channel as usize >= MAX_CHANNELS {
            return Err(TimerError::Unknown(channel));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(TimerError::Rejected(-1));
        }
        Ok(())
    }
}

impl TimerService for ManualTimer {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn schedule_once(&self, channel: u8, delay: Duration) -> Result<(), TimerError> {
        self.arm_calls.fetch_add(1, Ordering::SeqCst);
        self.check(channel)?;
        let deadline = self.now_ms() + delay.as_millis() as u64;
        self.slots()[channel as usize] = Some(deadline);
        Ok(())
    }

    fn cancel(&self, channel: u8) -> Result<(), TimerError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.check(channel)?;
        self.slots()[channel as usize] = None;
        Ok(())
    }
}

impl<I, O, D> Controller<I, O, ManualTimer, D>
where
    I: InputPin,
    O: OutputPin,
    D: DiagnosticSink,
{
    /// Run the virtual clock forward to `t_ms`, delivering every fire that
    /// falls due on the way.
    pub fn advance_to(&self, t_ms: u64) {
        while let Some(channel) = self.timer().pop_due(t_ms) {
            self.on_timer_fired(channel);
        }
        self.timer().now_ms.fetch_max(t_ms, Ordering::SeqCst);
    }

    pub fn advance_by(&self, ms: u64) {
        self.advance_to(self.timer().now_ms() + ms);
    }
}

// ── SimWiring ─────────────────────────────────────────────────

/// [`LineWiring`] over simulated lines, with an optional injected failure.
#[derive(Debug)]
pub struct SimWiring {
    lines: Vec<(SimLine, SimLine)>,
    fail_at: Option<(u8, WiringStep)>,
    configured: Vec<u8>,
    interrupts_enabled: bool,
}

impl SimWiring {
    /// `channels` fresh sensor/indicator pairs, indicators initially high so
    /// tests can see the wiring drive them off.
    pub fn new(channels: usize) -> Self {
        let lines = (0..channels)
            .map(|_| {
                let led = SimLine::new();
                led.drive(true);
                (SimLine::new(), led)
            })
            .collect();
        Self {
            lines,
            fail_at: None,
            configured: Vec::new(),
            interrupts_enabled: false,
        }
    }

    /// Fail `step` on `channel` (`IsrInstall` fails `enable_interrupts`).
    #[must_use]
    pub fn failing_at(mut self, channel: u8, step: WiringStep) -> Self {
        self.fail_at = Some((channel, step));
        self
    }

    pub fn sensor(&self, channel: u8) -> &SimLine {
        &self.lines[channel as usize].0
    }

    pub fn output(&self, channel: u8) -> &SimLine {
        &self.lines[channel as usize].1
    }

    /// Channels configured so far, in order.
    pub fn configured(&self) -> &[u8] {
        &self.configured
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    fn injected(&self, channel: u8, step: WiringStep) -> Result<(), WiringError> {
        match self.fail_at {
            Some((c, s)) if c == channel && s == step => Err(WiringError::new(channel, step, -1)),
            _ => Ok(()),
        }
    }
}

impl LineWiring for SimWiring {
    type Input = SimLine;
    type Output = SimLine;

    fn configure(
        &mut self,
        channel: u8,
        _pins: &ChannelConfig,
    ) -> Result<(SimLine, SimLine), WiringError> {
        let Some((sensor, output)) = self.lines.get(channel as usize).cloned() else {
            return Err(WiringError::new(channel, WiringStep::DeviceNotReady, -1));
        };
        self.injected(channel, WiringStep::DeviceNotReady)?;
        self.injected(channel, WiringStep::OutputConfig)?;
        output.drive(false);
        self.injected(channel, WiringStep::InputConfig)?;
        self.injected(channel, WiringStep::InterruptConfig)?;
        self.configured.push(channel);
        Ok((sensor, output))
    }

    fn enable_interrupts(&mut self) -> Result<(), WiringError> {
        if let Some((channel, WiringStep::IsrInstall)) = self.fail_at {
            return Err(WiringError::new(channel, WiringStep::IsrInstall, -1));
        }
        self.interrupts_enabled = true;
        Ok(())
    }
}
