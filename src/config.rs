//! System configuration parameters
//!
//! The channel table and quiet period are fixed per deployment: they are
//! built once at boot, validated before any hardware is touched, and never
//! changed while interrupts are live.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins;

/// Upper bound on wired channels (sizes every fixed table in the firmware).
pub const MAX_CHANNELS: usize = 8;

const _: () = assert!(pins::CHANNEL_PINS.len() <= MAX_CHANNELS);

/// Quiet period used when nothing else is configured (3 s).
pub const DEFAULT_QUIET_PERIOD_MS: u32 = 3_000;

/// Longest accepted quiet period (1 h).
pub const MAX_QUIET_PERIOD_MS: u32 = 3_600_000;

/// How a channel's indicator reacts to its sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelMode {
    /// On while active, off after the quiet period once inactive.
    #[default]
    Timed,
    /// Each active sample inverts the indicator; no off-timer.
    Toggle,
}

/// One sensor/indicator pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// GPIO of the motion sensor input.
    pub sensor_gpio: i32,
    /// GPIO of the indicator output.
    pub output_gpio: i32,
    pub mode: ChannelMode,
    /// `true` when a HIGH sensor line means motion (pull-down wiring).
    pub sensor_active_high: bool,
}

impl ChannelConfig {
    pub const fn timed(sensor_gpio: i32, output_gpio: i32) -> Self {
        Self {
            sensor_gpio,
            output_gpio,
            mode: ChannelMode::Timed,
            sensor_active_high: true,
        }
    }

    pub const fn toggle(sensor_gpio: i32, output_gpio: i32) -> Self {
        Self {
            sensor_gpio,
            output_gpio,
            mode: ChannelMode::Toggle,
            sensor_active_high: true,
        }
    }
}

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Delay between an inactive observation and the indicator turning off.
    pub quiet_period_ms: u32,
    /// Channel table, indexed by channel number.
    pub channels: heapless::Vec<ChannelConfig, MAX_CHANNELS>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let mut channels = heapless::Vec::new();
        for &(sensor, output) in &pins::CHANNEL_PINS {
            let pushed = channels.push(ChannelConfig::timed(sensor, output));
            debug_assert!(pushed.is_ok(), "CHANNEL_PINS exceeds MAX_CHANNELS");
        }
        Self {
            quiet_period_ms: DEFAULT_QUIET_PERIOD_MS,
            channels,
        }
    }
}

impl ControllerConfig {
    /// Build a config from an explicit channel list.
    pub fn with_channels(
        quiet_period_ms: u32,
        channels: &[ChannelConfig],
    ) -> Result<Self, ConfigError> {
        let channels = heapless::Vec::from_slice(channels)
            .map_err(|()| ConfigError::ValidationFailed("more than MAX_CHANNELS channels"))?;
        let config = Self {
            quiet_period_ms,
            channels,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot be wired safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(ConfigError::ValidationFailed("at least one channel required"));
        }
        if self.quiet_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("quiet_period_ms must be > 0"));
        }
        if self.quiet_period_ms > MAX_QUIET_PERIOD_MS {
            return Err(ConfigError::ValidationFailed("quiet_period_ms exceeds 1 hour"));
        }

        for (i, ch) in self.channels.iter().enumerate() {
            if ch.sensor_gpio < 0 || ch.output_gpio < 0 {
                return Err(ConfigError::ValidationFailed("GPIO numbers must be >= 0"));
            }
            if ch.sensor_gpio == ch.output_gpio {
                return Err(ConfigError::ValidationFailed("sensor and output share a GPIO"));
            }
            for other in &self.channels[i + 1..] {
                let a = [ch.sensor_gpio, ch.output_gpio];
                if a.contains(&other.sensor_gpio) || a.contains(&other.output_gpio) {
                    return Err(ConfigError::ValidationFailed("GPIO assigned to two channels"));
                }
            }
        }
        Ok(())
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
