//! Channel controller — the fixed channel table plus its shared collaborators.
//!
//! Built once by the [`registry`](super::registry) and never resized.  After
//! construction it is only reached through `&self`: edge ISRs call
//! [`on_edge`](Controller::on_edge), the timer task calls
//! [`on_timer_fired`](Controller::on_timer_fired).  Channels are independent;
//! each serializes its own handler and callback.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::events::ChannelEvent;
use crate::app::ports::{DiagnosticSink, LineWiring, TimerService};
use crate::channel::{Channel, ChannelSnapshot};
use crate::config::MAX_CHANNELS;
use crate::error::Result;

pub struct Controller<I, O, T, D> {
    channels: heapless::Vec<Channel<I, O>, MAX_CHANNELS>,
    timer: T,
    sink: D,
}

impl<I, O, T, D> Controller<I, O, T, D>
where
    I: InputPin,
    O: OutputPin,
    T: TimerService,
    D: DiagnosticSink,
{
    pub(crate) fn new(channels: heapless::Vec<Channel<I, O>, MAX_CHANNELS>, timer: T, sink: D) -> Self {
        Self {
            channels,
            timer,
            sink,
        }
    }

    /// Unmask edge interrupts.  Must be called once, after the controller is
    /// reachable from the ISRs.
    pub fn enable<W: LineWiring>(&self, wiring: &mut W) -> Result<()> {
        wiring.enable_interrupts()?;
        self.sink.emit(ChannelEvent::Ready {
            channels: self.channels.len() as u8,
        });
        Ok(())
    }

    /// Edge interrupt entry point for `channel`.  Unknown indices are ignored.
    pub fn on_edge(&self, channel: u8) {
        if let Some(ch) = self.channels.get(channel as usize) {
            ch.on_edge(&self.timer, &self.sink);
        }
    }

    /// Deferred-off timer entry point for `channel`.  Unknown indices are ignored.
    pub fn on_timer_fired(&self, channel: u8) {
        if let Some(ch) = self.channels.get(channel as usize) {
            ch.on_timer_fired(&self.timer, &self.sink);
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn snapshot(&self, channel: u8) -> Option<ChannelSnapshot> {
        self.channels.get(channel as usize).map(Channel::snapshot)
    }

    pub fn snapshots(&self) -> impl Iterator<Item = ChannelSnapshot> + '_ {
        self.channels.iter().map(Channel::snapshot)
    }

    /// `false` for unknown channels.
    pub fn output_is_on(&self, channel: u8) -> bool {
        self.channels
            .get(channel as usize)
            .is_some_and(Channel::output_is_on)
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }
}
