//! Startup wiring: validation, fail-fast order, interrupt enable.

use motionlamp::adapters::sim::{ManualTimer, SimWiring};
use motionlamp::app::events::ChannelEvent;
use motionlamp::app::registry;
use motionlamp::config::{ChannelConfig, ControllerConfig};
use motionlamp::error::{Error, WiringError, WiringStep};

use crate::mock_hw::{QUIET_MS, RecordingSink};

fn config(channels: usize) -> ControllerConfig {
    let pins: Vec<ChannelConfig> = (0..channels as i32)
        .map(|i| ChannelConfig::timed(i, 20 + i))
        .collect();
    ControllerConfig::with_channels(QUIET_MS, &pins).unwrap()
}

#[test]
fn start_wires_every_channel_and_drives_outputs_off() {
    let cfg = config(5);
    let mut wiring = SimWiring::new(5);
    for ch in 0..5 {
        assert!(wiring.output(ch).level(), "bench LEDs start high");
    }

    let controller =
        registry::start(&cfg, &mut wiring, ManualTimer::new(), RecordingSink::new()).unwrap();

    assert_eq!(controller.channel_count(), 5);
    assert_eq!(wiring.configured(), &[0, 1, 2, 3, 4]);
    assert!(wiring.interrupts_enabled());
    for ch in 0..5 {
        assert!(!wiring.output(ch).level());
        assert!(!controller.output_is_on(ch));
        assert_eq!(wiring.output(ch).writes(), 0, "core must not write before an edge");
    }
    assert_eq!(
        controller.sink().events(),
        vec![ChannelEvent::Ready { channels: 5 }]
    );
}

#[test]
fn wire_channels_leaves_interrupts_masked() {
    let cfg = config(3);
    let mut wiring = SimWiring::new(3);
    let controller =
        registry::wire_channels(&cfg, &mut wiring, ManualTimer::new(), RecordingSink::new())
            .unwrap();

    assert!(!wiring.interrupts_enabled());
    assert!(controller.sink().events().is_empty());

    controller.enable(&mut wiring).unwrap();
    assert!(wiring.interrupts_enabled());
}

#[test]
fn failure_aborts_at_the_failing_channel() {
    for step in [
        WiringStep::DeviceNotReady,
        WiringStep::OutputConfig,
        WiringStep::InputConfig,
        WiringStep::InterruptConfig,
    ] {
        let cfg = config(5);
        let mut wiring = SimWiring::new(5).failing_at(3, step);
        let err = registry::start(&cfg, &mut wiring, ManualTimer::new(), RecordingSink::new())
            .err()
            .expect("startup must fail");

        assert_eq!(err, Error::Wiring(WiringError::new(3, step, -1)), "{step:?}");
        assert_eq!(wiring.configured(), &[0, 1, 2], "{step:?}");
        assert!(!wiring.interrupts_enabled(), "{step:?}");
    }
}

#[test]
fn isr_install_failure_is_fatal() {
    let cfg = config(2);
    let mut wiring = SimWiring::new(2).failing_at(0, WiringStep::IsrInstall);
    let err = registry::start(&cfg, &mut wiring, ManualTimer::new(), RecordingSink::new())
        .err()
        .expect("startup must fail");

    assert!(matches!(
        err,
        Error::Wiring(WiringError {
            step: WiringStep::IsrInstall,
            ..
        })
    ));
    assert!(!wiring.interrupts_enabled());
}

#[test]
fn invalid_config_rejected_before_any_wiring() {
    let mut cfg = config(2);
    cfg.quiet_period_ms = 0;
    let mut wiring = SimWiring::new(2);

    let err = registry::start(&cfg, &mut wiring, ManualTimer::new(), RecordingSink::new())
        .err()
        .expect("startup must fail");

    assert!(matches!(err, Error::Config(_)));
    assert!(wiring.configured().is_empty());
    assert!(wiring.output(0).level(), "no line was touched");
}

#[test]
fn more_channels_than_lines_reports_device_not_ready() {
    let cfg = config(3);
    let mut wiring = SimWiring::new(2);
    let err = registry::start(&cfg, &mut wiring, ManualTimer::new(), RecordingSink::new())
        .err()
        .expect("startup must fail");

    assert_eq!(
        err,
        Error::Wiring(WiringError::new(2, WiringStep::DeviceNotReady, -1))
    );
}

#[test]
fn default_config_wires_five_channels() {
    let cfg = ControllerConfig::default();
    let mut wiring = SimWiring::new(cfg.channel_count());
    let controller =
        registry::start(&cfg, &mut wiring, ManualTimer::new(), RecordingSink::new()).unwrap();
    assert_eq!(controller.channel_count(), 5);
}
