//! Log-based diagnostic sink adapter.
//!
//! Implements [`DiagnosticSink`] by writing one line per channel event to
//! the `log` facade (ESP-IDF logger → UART / USB-CDC in production).  Only
//! use it from task context; ISRs go through the
//! [`DiagnosticQueue`](crate::diagnostics::DiagnosticQueue).

use log::{info, warn};

use crate::app::events::ChannelEvent;
use crate::app::ports::DiagnosticSink;

/// Adapter that logs every [`ChannelEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticSink for LogSink {
    fn emit(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::Ready { channels } => {
                info!("READY | {} PIR/LED pair(s) armed", channels);
            }
            ChannelEvent::Activated {
                channel,
                cancelled_off,
            } => {
                if cancelled_off {
                    info!("PIR {} active -> LED {} ON (pending off cancelled)", channel, channel);
                } else {
                    info!("PIR {} active -> LED {} ON", channel, channel);
                }
            }
            ChannelEvent::OffScheduled {
                channel,
                delay_ms,
                rearmed,
            } => {
                info!(
                    "PIR {} inactive -> LED {} will turn OFF in {}ms{}",
                    channel,
                    channel,
                    delay_ms,
                    if rearmed { " (restarted)" } else { "" }
                );
            }
            ChannelEvent::TimedOff { channel } => {
                info!("LED {} turned off after timeout", channel);
            }
            ChannelEvent::Toggled { channel, on } => {
                info!("PIR {} active -> LED {} {}", channel, channel, if on { "ON" } else { "OFF" });
            }
            ChannelEvent::StaleFire { channel } => {
                info!("LED {} off-timer fired after cancel/re-arm, ignored", channel);
            }
            ChannelEvent::Fault { channel, primitive } => {
                warn!("FAULT | channel {}: {} failed, output left unchanged", channel, primitive);
            }
        }
    }
}
