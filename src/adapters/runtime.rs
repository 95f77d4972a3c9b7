//! Process-wide controller table and ISR-safe diagnostics for ESP-IDF.
//!
//! ISR and esp_timer callbacks cannot capture state, so they reach the
//! controller through a `OnceLock` installed once by `main` before
//! interrupts are enabled.

use std::num::NonZeroU32;
use std::sync::{Arc, OnceLock};

use esp_idf_hal::task::notification::Notifier;

use crate::adapters::esp_timer::EspTimerService;
use crate::adapters::gpio::{EspInputLine, EspOutputLine};
use crate::app::controller::Controller;
use crate::app::events::ChannelEvent;
use crate::app::ports::DiagnosticSink;
use crate::diagnostics::DiagnosticQueue;

pub type EspController = Controller<EspInputLine, EspOutputLine, EspTimerService, NotifyingSink>;

static CONTROLLER: OnceLock<EspController> = OnceLock::new();

/// Events waiting for the main task.
pub static DIAGNOSTICS: DiagnosticQueue = DiagnosticQueue::new();

/// Publish the controller to the ISRs.  The first install wins.
pub fn install(controller: EspController) -> &'static EspController {
    CONTROLLER.get_or_init(|| controller)
}

pub(crate) fn controller() -> Option<&'static EspController> {
    CONTROLLER.get()
}

/// Queues events and wakes the parked main task.
pub struct NotifyingSink {
    notifier: Arc<Notifier>,
}

impl NotifyingSink {
    pub fn new(notifier: Arc<Notifier>) -> Self {
        Self { notifier }
    }
}

impl DiagnosticSink for NotifyingSink {
    fn emit(&self, event: ChannelEvent) {
        DIAGNOSTICS.push(event);
        // SAFETY: task notification is ISR-safe; the main task created the
        // Notification and never exits.
        unsafe {
            self.notifier.notify_and_yield(NonZeroU32::MIN);
        }
    }
}
