//! Deferred-off timers on ESP-IDF's esp_timer API.
//!
//! One one-shot timer per channel, created at startup with the channel
//! index as its argument.  Callbacks are dispatched in the esp_timer task
//! (not ISR), which is the worker context the channel core expects.

use core::time::Duration;

use esp_idf_svc::sys::*;
use log::info;

use crate::adapters::runtime;
use crate::app::ports::TimerService;
use crate::config::MAX_CHANNELS;
use crate::error::{TimerError, WiringError, WiringStep};

struct TimerHandle(esp_timer_handle_t);

// SAFETY: the handle is an opaque driver token; esp_timer serializes
// start/stop internally and both are callable from any task or ISR.
unsafe impl Send for TimerHandle {}
unsafe impl Sync for TimerHandle {}

pub struct EspTimerService {
    handles: heapless::Vec<TimerHandle, MAX_CHANNELS>,
}

unsafe extern "C" fn off_timer_cb(arg: *mut core::ffi::c_void) {
    let channel = arg as usize as u8;
    if let Some(controller) = runtime::controller() {
        controller.on_timer_fired(channel);
    }
}

impl EspTimerService {
    /// Create one idle timer per channel.
    pub fn new(channels: usize) -> Result<Self, WiringError> {
        if channels > MAX_CHANNELS {
            return Err(WiringError::new(
                MAX_CHANNELS as u8,
                WiringStep::TimerCreate,
                ESP_ERR_INVALID_ARG as i32,
            ));
        }
        let mut handles = heapless::Vec::new();
        for i in 0..channels {
            let args = esp_timer_create_args_t {
                callback: Some(off_timer_cb),
                arg: i as *mut core::ffi::c_void,
                dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
                name: b"led_off\0".as_ptr() as *const _,
                skip_unhandled_events: false,
            };
            let mut handle: esp_timer_handle_t = core::ptr::null_mut();
            // SAFETY: single-threaded startup; `args` outlives the call.
            let ret = unsafe { esp_timer_create(&args, &mut handle) };
            if ret != ESP_OK as i32 {
                return Err(WiringError::new(i as u8, WiringStep::TimerCreate, ret));
            }
            handles.push(TimerHandle(handle)).map_err(|_| {
                WiringError::new(i as u8, WiringStep::TimerCreate, ESP_ERR_NO_MEM as i32)
            })?;
        }
        info!("esp_timer: {} off-timer(s) created", handles.len());
        Ok(Self { handles })
    }

    fn handle(&self, channel: u8) -> Result<esp_timer_handle_t, TimerError> {
        self.handles
            .get(channel as usize)
            .map(|h| h.0)
            .ok_or(TimerError::Unknown(channel))
    }
}

impl TimerService for EspTimerService {
    fn now_ms(&self) -> u64 {
        // SAFETY: RTC counter read; safe in ISR context.
        (unsafe { esp_timer_get_time() }) as u64 / 1_000
    }

    fn schedule_once(&self, channel: u8, delay: Duration) -> Result<(), TimerError> {
        let handle = self.handle(channel)?;
        // SAFETY: valid handle created in `new`; stop on an idle timer
        // returns ESP_ERR_INVALID_STATE, which just means nothing to restart.
        unsafe {
            esp_timer_stop(handle);
            let ret = esp_timer_start_once(handle, delay.as_micros() as u64);
            if ret != ESP_OK as i32 {
                return Err(TimerError::Rejected(ret));
            }
        }
        Ok(())
    }

    fn cancel(&self, channel: u8) -> Result<(), TimerError> {
        let handle = self.handle(channel)?;
        // SAFETY: valid handle created in `new`.
        let ret = unsafe { esp_timer_stop(handle) };
        if ret == ESP_OK as i32 || ret == ESP_ERR_INVALID_STATE as i32 {
            Ok(())
        } else {
            Err(TimerError::Rejected(ret))
        }
    }
}
