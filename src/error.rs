//! Unified error types for the MotionLamp firmware.
//!
//! Startup failures (bad configuration, a line that will not configure)
//! funnel into [`Error`] and abort boot before any interrupt is enabled.
//! Runtime primitive failures never become an `Error`: the channel records a
//! [`Primitive`] fault and keeps its last known output.  All types are `Copy`
//! so they can cross the ISR / timer-task boundary without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level startup error
// ---------------------------------------------------------------------------

/// Every fallible startup step funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration failed validation.
    Config(ConfigError),
    /// A channel's sensor or indicator line could not be wired.
    Wiring(WiringError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Wiring(e) => write!(f, "wiring: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Wiring errors
// ---------------------------------------------------------------------------

/// The startup step that failed while wiring a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WiringStep {
    /// GPIO port / pin is not usable on this chip.
    DeviceNotReady,
    /// Indicator line could not be configured as an output driven off.
    OutputConfig,
    /// Sensor line could not be configured as an input.
    InputConfig,
    /// Both-edges interrupt could not be configured or enabled.
    InterruptConfig,
    /// The shared GPIO ISR service could not be installed.
    IsrInstall,
    /// The channel's deferred-off timer could not be created.
    TimerCreate,
}

impl fmt::Display for WiringStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotReady => write!(f, "GPIO device not ready"),
            Self::OutputConfig => write!(f, "output config failed"),
            Self::InputConfig => write!(f, "input config failed"),
            Self::InterruptConfig => write!(f, "interrupt config failed"),
            Self::IsrInstall => write!(f, "ISR service install failed"),
            Self::TimerCreate => write!(f, "off-timer create failed"),
        }
    }
}

/// Which channel failed, at which step, with the driver's return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WiringError {
    pub channel: u8,
    pub step: WiringStep,
    pub code: i32,
}

impl WiringError {
    pub const fn new(channel: u8, step: WiringStep, code: i32) -> Self {
        Self { channel, step, code }
    }
}

impl fmt::Display for WiringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel {}: {} (rc={})", self.channel, self.step, self.code)
    }
}

impl std::error::Error for WiringError {}

impl From<WiringError> for Error {
    fn from(e: WiringError) -> Self {
        Self::Wiring(e)
    }
}

// ---------------------------------------------------------------------------
// Runtime primitive faults
// ---------------------------------------------------------------------------

/// The primitive operation that failed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Sensor level read.
    ReadLevel,
    /// Indicator level write.
    SetLevel,
    /// Deferred-off timer arm.
    ArmTimer,
    /// Deferred-off timer cancel.
    CancelTimer,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadLevel => write!(f, "read level"),
            Self::SetLevel => write!(f, "set level"),
            Self::ArmTimer => write!(f, "arm timer"),
            Self::CancelTimer => write!(f, "cancel timer"),
        }
    }
}

/// Errors returned by a [`TimerService`](crate::app::ports::TimerService).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// No timer exists for this channel index.
    Unknown(u8),
    /// The underlying timer driver rejected the request.
    Rejected(i32),
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(ch) => write!(f, "no timer for channel {}", ch),
            Self::Rejected(rc) => write!(f, "timer driver rejected request (rc={})", rc),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
