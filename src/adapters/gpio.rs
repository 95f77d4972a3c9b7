//! ESP-IDF GPIO adapter.
//!
//! Raw `gpio_*` sys calls behind `embedded-hal` pins, plus the startup
//! wiring that configures each PIR/LED pair and registers one edge ISR per
//! channel.  The ISR argument is the channel index; the handler looks the
//! channel up in the installed controller table.

use core::convert::Infallible;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};
use esp_idf_svc::sys::*;
use log::info;

use crate::adapters::runtime;
use crate::app::ports::LineWiring;
use crate::config::{ChannelConfig, MAX_CHANNELS};
use crate::error::{WiringError, WiringStep};

// ── Lines ─────────────────────────────────────────────────────

/// PIR input line.  Level reads are plain register reads and cannot fail.
#[derive(Debug)]
pub struct EspInputLine {
    gpio: i32,
}

impl ErrorType for EspInputLine {
    type Error = Infallible;
}

impl InputPin for EspInputLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        // SAFETY: register read on a pin configured as input during wiring;
        // safe in ISR context.
        Ok((unsafe { gpio_get_level(self.gpio) }) != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

/// `gpio_set_level` return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EspGpioError(pub esp_err_t);

impl digital::Error for EspGpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// LED output line.
#[derive(Debug)]
pub struct EspOutputLine {
    gpio: i32,
}

impl EspOutputLine {
    fn set(&mut self, high: bool) -> Result<(), EspGpioError> {
        // SAFETY: register write on a pin configured as output during
        // wiring; only this channel writes it.
        let ret = unsafe { gpio_set_level(self.gpio, u32::from(high)) };
        if ret != ESP_OK as i32 {
            return Err(EspGpioError(ret));
        }
        Ok(())
    }
}

impl ErrorType for EspOutputLine {
    type Error = EspGpioError;
}

impl OutputPin for EspOutputLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true)
    }
}

// ── Wiring ────────────────────────────────────────────────────

/// Startup wiring for ESP32-S3 GPIO.
#[derive(Debug, Default)]
pub struct EspGpioWiring {
    /// Sensor GPIOs, indexed by channel.
    sensors: heapless::Vec<i32, MAX_CHANNELS>,
}

impl EspGpioWiring {
    pub fn new() -> Self {
        Self::default()
    }
}

fn gpio_valid(pin: i32) -> bool {
    (0..gpio_num_t_GPIO_NUM_MAX as i32).contains(&pin)
}

impl LineWiring for EspGpioWiring {
    type Input = EspInputLine;
    type Output = EspOutputLine;

    fn configure(
        &mut self,
        channel: u8,
        pins: &ChannelConfig,
    ) -> Result<(EspInputLine, EspOutputLine), WiringError> {
        let fail = |step, rc| WiringError::new(channel, step, rc);

        if !gpio_valid(pins.sensor_gpio) || !gpio_valid(pins.output_gpio) {
            return Err(fail(WiringStep::DeviceNotReady, ESP_ERR_INVALID_ARG as i32));
        }

        // Indicator: push-pull output, driven inactive before anything else.
        let out_cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pins.output_gpio,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: single-threaded startup, before any ISR is registered.
        let ret = unsafe { gpio_config(&out_cfg) };
        if ret != ESP_OK as i32 {
            return Err(fail(WiringStep::OutputConfig, ret));
        }
        let ret = unsafe { gpio_set_level(pins.output_gpio, 0) };
        if ret != ESP_OK as i32 {
            return Err(fail(WiringStep::OutputConfig, ret));
        }

        // Sensor: input pulled toward its inactive level, both edges.
        let (pull_up, pull_down) = if pins.sensor_active_high {
            (gpio_pullup_t_GPIO_PULLUP_DISABLE, gpio_pulldown_t_GPIO_PULLDOWN_ENABLE)
        } else {
            (gpio_pullup_t_GPIO_PULLUP_ENABLE, gpio_pulldown_t_GPIO_PULLDOWN_DISABLE)
        };
        let in_cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pins.sensor_gpio,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: pull_up,
            pull_down_en: pull_down,
            intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
        };
        let ret = unsafe { gpio_config(&in_cfg) };
        if ret != ESP_OK as i32 {
            return Err(fail(WiringStep::InputConfig, ret));
        }

        // Masked until every channel is wired.
        let ret = unsafe { gpio_intr_disable(pins.sensor_gpio) };
        if ret != ESP_OK as i32 {
            return Err(fail(WiringStep::InterruptConfig, ret));
        }

        if self.sensors.push(pins.sensor_gpio).is_err() {
            return Err(fail(WiringStep::DeviceNotReady, ESP_ERR_NO_MEM as i32));
        }

        Ok((
            EspInputLine {
                gpio: pins.sensor_gpio,
            },
            EspOutputLine {
                gpio: pins.output_gpio,
            },
        ))
    }

    fn enable_interrupts(&mut self) -> Result<(), WiringError> {
        // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
        // means it was already installed (acceptable).  The handler below
        // only reaches the controller through its OnceLock.
        unsafe {
            let ret = gpio_install_isr_service(0);
            if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
                return Err(WiringError::new(0, WiringStep::IsrInstall, ret));
            }

            for (i, &gpio) in self.sensors.iter().enumerate() {
                let ret = gpio_isr_handler_add(gpio, Some(edge_isr), i as *mut core::ffi::c_void);
                if ret != ESP_OK as i32 {
                    return Err(WiringError::new(i as u8, WiringStep::InterruptConfig, ret));
                }
                let ret = gpio_intr_enable(gpio);
                if ret != ESP_OK as i32 {
                    return Err(WiringError::new(i as u8, WiringStep::InterruptConfig, ret));
                }
            }
        }

        info!("gpio: edge ISRs live on {} sensor(s)", self.sensors.len());
        Ok(())
    }
}

/// Per-channel edge ISR.  `arg` carries the channel index.
unsafe extern "C" fn edge_isr(arg: *mut core::ffi::c_void) {
    let channel = arg as usize as u8;
    if let Some(controller) = runtime::controller() {
        controller.on_edge(channel);
    }
}
