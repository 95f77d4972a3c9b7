//! Port traits — the hexagonal boundary between channel logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Sensor and indicator lines are plain `embedded-hal` digital pins.  The
//! remaining collaborators (deferred timer, diagnostics, startup wiring) are
//! defined here.  Ports reached from interrupt context take `&self` and must
//! never block.

use core::time::Duration;

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::events::ChannelEvent;
use crate::config::ChannelConfig;
use crate::error::{TimerError, WiringError};

// ───────────────────────────────────────────────────────────────
// Deferred timer service (driven adapter: domain → timer hardware)
// ───────────────────────────────────────────────────────────────

/// One-shot deferred-off timers, one per channel.
///
/// The callback is bound when the service is created: a fire for channel
/// `i` must end up in [`Controller::on_timer_fired`](crate::app::controller::Controller::on_timer_fired)
/// with the same `i`, from a non-interrupt context.
pub trait TimerService {
    /// Monotonic time in milliseconds, on the same clock the timers run on.
    /// Must be callable from interrupt context.
    fn now_ms(&self) -> u64;

    /// Arm the channel's timer to fire once after `delay`.  Arming an armed
    /// timer restarts its countdown; it never stacks a second fire.
    fn schedule_once(&self, channel: u8, delay: Duration) -> Result<(), TimerError>;

    /// Disarm the channel's timer.  Returns `Ok(())` if nothing was pending.
    fn cancel(&self, channel: u8) -> Result<(), TimerError>;
}

// ───────────────────────────────────────────────────────────────
// Diagnostic sink (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The channel core emits [`ChannelEvent`]s through this port.
///
/// Called from interrupt context: implementations must be non-blocking and
/// may drop events.  Nothing in the core depends on delivery.
pub trait DiagnosticSink {
    fn emit(&self, event: ChannelEvent);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn emit(&self, event: ChannelEvent) {
        (**self).emit(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _event: ChannelEvent) {}
}

// ───────────────────────────────────────────────────────────────
// Line wiring (driven adapter: startup → GPIO configuration)
// ───────────────────────────────────────────────────────────────

/// Startup-time configuration of sensor and indicator lines.
///
/// The registry calls [`configure`](Self::configure) for every channel in
/// order, and [`enable_interrupts`](Self::enable_interrupts) exactly once
/// after all of them succeeded.  No edge may reach the controller before
/// `enable_interrupts`.
pub trait LineWiring {
    type Input: InputPin;
    type Output: OutputPin;

    /// Check readiness of both lines, drive the indicator off, and prepare
    /// the sensor for both-edges interrupts (still masked).
    fn configure(
        &mut self,
        channel: u8,
        pins: &ChannelConfig,
    ) -> Result<(Self::Input, Self::Output), WiringError>;

    /// Unmask edge interrupts on every configured sensor.
    fn enable_interrupts(&mut self) -> Result<(), WiringError>;
}
