//! MotionLamp Firmware — Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PIR edge ISR (per channel)        esp_timer task            │
//! │        │ on_edge(i)                     │ on_timer_fired(i)  │
//! │        ▼                                ▼                    │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Controller — fixed channel table, one critical        │  │
//! │  │  section per channel                                   │  │
//! │  └───────────────┬────────────────────────────────────────┘  │
//! │                  │ ChannelEvent (lock-free queue + notify)   │
//! │                  ▼                                           │
//! │  Main task: parked on task notification, drains + logs       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::BLOCK;
use esp_idf_hal::task::notification::Notification;
use log::{info, warn};

use motionlamp::adapters::esp_timer::EspTimerService;
use motionlamp::adapters::gpio::EspGpioWiring;
use motionlamp::adapters::log_sink::LogSink;
use motionlamp::adapters::runtime::{self, NotifyingSink, DIAGNOSTICS};
use motionlamp::app::ports::DiagnosticSink;
use motionlamp::app::registry;
use motionlamp::config::ControllerConfig;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("MotionLamp v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Static channel table ───────────────────────────────
    let config = ControllerConfig::default();
    info!(
        "{} channel(s), quiet period {}ms",
        config.channel_count(),
        config.quiet_period_ms
    );

    // ── 3. Wire every channel (fail-fast, interrupts masked) ──
    let notification = Notification::new();
    let sink = NotifyingSink::new(notification.notifier());
    let timer = EspTimerService::new(config.channel_count())?;
    let mut wiring = EspGpioWiring::new();
    let controller = registry::wire_channels(&config, &mut wiring, timer, sink)?;

    // ── 4. Publish to ISRs, then unmask edges ─────────────────
    let controller = runtime::install(controller);
    controller.enable(&mut wiring)?;
    info!("PIR/LED pairs ready");

    // ── 5. Park; wake only to flush diagnostics ───────────────
    let log = LogSink::new();
    loop {
        notification.wait(BLOCK);
        DIAGNOSTICS.drain(|event| log.emit(event));
        let dropped = DIAGNOSTICS.take_dropped();
        if dropped > 0 {
            warn!("diagnostics: {} event(s) dropped (queue full)", dropped);
        }
    }
}
