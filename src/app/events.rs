//! Outbound channel events.
//!
//! The channel core emits these through the
//! [`DiagnosticSink`](super::ports::DiagnosticSink) port.  They are advisory:
//! one record per transition, never a control dependency.

use crate::error::Primitive;

/// Structured events emitted by the channel core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Every channel is wired and edge interrupts are live.
    Ready { channels: u8 },

    /// Sensor sampled active; indicator on.  `cancelled_off` is set when a
    /// pending turn-off was dropped.
    Activated { channel: u8, cancelled_off: bool },

    /// Sensor sampled inactive; turn-off armed.  `rearmed` is set when an
    /// already-armed countdown was restarted.
    OffScheduled {
        channel: u8,
        delay_ms: u32,
        rearmed: bool,
    },

    /// Quiet period elapsed; indicator off.
    TimedOff { channel: u8 },

    /// Toggle-mode channel inverted its indicator.
    Toggled { channel: u8, on: bool },

    /// A timer fire arrived after its arm was cancelled or superseded.
    StaleFire { channel: u8 },

    /// A runtime primitive failed; the channel kept its last output.
    Fault { channel: u8, primitive: Primitive },
}

impl ChannelEvent {
    /// Channel the event belongs to, `None` for controller-wide events.
    pub fn channel(&self) -> Option<u8> {
        match *self {
            Self::Ready { .. } => None,
            Self::Activated { channel, .. }
            | Self::OffScheduled { channel, .. }
            | Self::TimedOff { channel }
            | Self::Toggled { channel, .. }
            | Self::StaleFire { channel }
            | Self::Fault { channel, .. } => Some(channel),
        }
    }
}
