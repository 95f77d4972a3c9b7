//! Channel registry — one-shot startup wiring.
//!
//! Validates the configuration, wires every channel in order, and only then
//! hands back a [`Controller`].  Any failure aborts startup: there is no
//! degraded mode with a subset of channels.

use log::{error, info};

use crate::app::controller::Controller;
use crate::app::ports::{DiagnosticSink, LineWiring, TimerService};
use crate::channel::Channel;
use crate::config::ControllerConfig;
use crate::error::{ConfigError, Result};

/// Wire every configured channel.  Interrupts stay masked; call
/// [`Controller::enable`] once the controller is reachable from the ISRs.
pub fn wire_channels<W, T, D>(
    config: &ControllerConfig,
    wiring: &mut W,
    timer: T,
    sink: D,
) -> Result<Controller<W::Input, W::Output, T, D>>
where
    W: LineWiring,
    T: TimerService,
    D: DiagnosticSink,
{
    if let Err(e) = config.validate() {
        error!("registry: config rejected: {}", e);
        return Err(e.into());
    }

    let mut channels = heapless::Vec::new();
    for (i, pins) in config.channels.iter().enumerate() {
        let index = i as u8;
        let (sensor, output) = wiring.configure(index, pins).inspect_err(|e| {
            error!("registry: {}; aborting startup", e);
        })?;
        info!(
            "registry: channel {} wired (PIR gpio{} -> LED gpio{}, {:?})",
            index, pins.sensor_gpio, pins.output_gpio, pins.mode
        );
        channels
            .push(Channel::new(
                index,
                pins,
                config.quiet_period_ms,
                sensor,
                output,
            ))
            .map_err(|_| ConfigError::ValidationFailed("more than MAX_CHANNELS channels"))?;
    }

    Ok(Controller::new(channels, timer, sink))
}

/// Wire every channel and enable interrupts in one step, for owners that do
/// not need to publish the controller to ISRs in between.
pub fn start<W, T, D>(
    config: &ControllerConfig,
    wiring: &mut W,
    timer: T,
    sink: D,
) -> Result<Controller<W::Input, W::Output, T, D>>
where
    W: LineWiring,
    T: TimerService,
    D: DiagnosticSink,
{
    let controller = wire_channels(config, wiring, timer, sink)?;
    controller.enable(wiring)?;
    info!("registry: {} channel(s) ready", controller.channel_count());
    Ok(controller)
}
