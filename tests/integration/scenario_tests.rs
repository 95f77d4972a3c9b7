//! End-to-end channel behaviour over the simulated bench.
//!
//! Five timed channels, three-second quiet period, virtual clock in ms.

use motionlamp::app::events::ChannelEvent;
use motionlamp::config::{ChannelConfig, ControllerConfig};

use crate::mock_hw::{Bench, QUIET_MS, secs};

fn five_channels() -> Bench {
    Bench::new(5)
}

// ── Basic latch / off ─────────────────────────────────────────

#[test]
fn active_turns_on_immediately_without_timer() {
    let b = five_channels();
    b.sense(2, true);

    assert!(b.led(2));
    assert!(b.controller.output_is_on(2));
    assert!(!b.armed(2));
    assert_eq!(b.controller.timer().pending(2), None);
}

#[test]
fn inactive_turns_off_after_quiet_period() {
    let b = five_channels();
    b.sense(2, true);
    b.sense(2, false);

    assert!(b.armed(2));
    assert_eq!(b.controller.timer().pending(2), Some(secs(3)));

    b.at(secs(3) - 1);
    assert!(b.led(2), "must not turn off before the deadline");

    b.at(secs(3));
    assert!(!b.led(2));
    assert!(!b.armed(2));
    assert_eq!(b.sink().timed_offs(2), 1);
}

#[test]
fn off_happens_exactly_once() {
    let b = five_channels();
    b.sense(2, true);
    b.sense(2, false);

    b.at(secs(30));
    assert!(!b.led(2));
    assert_eq!(b.sink().timed_offs(2), 1);
    assert_eq!(b.controller.snapshot(2).unwrap().stats.timed_offs, 1);
}

// ── Cancellation ──────────────────────────────────────────────

#[test]
fn active_before_deadline_cancels_off() {
    let b = five_channels();
    b.sense(2, true);
    b.sense(2, false);

    b.at(secs(1));
    b.sense(2, true);
    assert!(b.led(2));
    assert!(!b.armed(2));
    assert_eq!(b.controller.timer().pending(2), None);

    b.at(secs(60));
    assert!(b.led(2), "cancelled timer must never turn the LED off");
    assert_eq!(b.sink().timed_offs(2), 0);

    let activated = b
        .sink()
        .for_channel(2)
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                ChannelEvent::Activated {
                    cancelled_off: true,
                    ..
                }
            )
        })
        .count();
    assert_eq!(activated, 1);
}

// ── Re-arm collapses ──────────────────────────────────────────

#[test]
fn duplicate_inactive_rearms_to_later_deadline() {
    let b = five_channels();
    b.sense(2, true);
    b.sense(2, false);

    b.at(secs(1));
    b.sense(2, false);
    assert_eq!(b.controller.timer().pending(2), Some(secs(4)));

    b.at(secs(3));
    assert!(b.led(2), "first arm was superseded");

    b.at(secs(4));
    assert!(!b.led(2));

    b.at(secs(10));
    assert_eq!(b.sink().timed_offs(2), 1);
}

#[test]
fn rearm_is_reported() {
    let b = five_channels();
    b.sense(2, false);
    b.sense(2, false);

    let scheduled: Vec<_> = b
        .sink()
        .for_channel(2)
        .into_iter()
        .filter_map(|e| match e {
            ChannelEvent::OffScheduled {
                delay_ms, rearmed, ..
            } => Some((delay_ms, rearmed)),
            _ => None,
        })
        .collect();
    assert_eq!(scheduled, vec![(QUIET_MS, false), (QUIET_MS, true)]);
}

// ── Independence ──────────────────────────────────────────────

#[test]
fn channels_do_not_interact() {
    let b = five_channels();
    b.sense(0, true);
    b.sense(3, true);

    assert!(b.led(0));
    assert!(b.led(3));
    for ch in [1, 2, 4] {
        assert!(!b.led(ch));
        assert!(!b.armed(ch));
    }

    b.sense(0, false);
    assert!(b.armed(0));
    assert!(!b.armed(3));

    b.at(secs(3));
    assert!(!b.led(0));
    assert!(b.led(3), "channel 3 has no pending off");
}

#[test]
fn staggered_channels_turn_off_at_their_own_deadlines() {
    let b = five_channels();
    for ch in 0..5 {
        b.sense(ch, true);
    }
    // Arms at 0, 0.5, 1.0, 1.5, 2.0 s: all before the first deadline.
    for ch in 0..5u8 {
        b.at(u64::from(ch) * 500);
        b.sense(ch, false);
    }

    for ch in 0..5u8 {
        b.at(u64::from(ch) * 500 + u64::from(QUIET_MS));
        for other in 0..5u8 {
            assert_eq!(b.led(other), other > ch, "after channel {ch} deadline, channel {other}");
        }
    }
}

// ── Toggle and polarity ───────────────────────────────────────

#[test]
fn toggle_channel_flips_on_each_activation() {
    let config = ControllerConfig::with_channels(
        QUIET_MS,
        &[ChannelConfig::timed(4, 38), ChannelConfig::toggle(5, 39)],
    )
    .unwrap();
    let b = Bench::with_config(&config);

    b.sense(1, true);
    assert!(b.led(1));
    b.sense(1, false);
    assert!(b.led(1), "inactive sample is ignored in toggle mode");
    b.sense(1, true);
    assert!(!b.led(1));

    b.at(secs(60));
    assert!(!b.led(1));
    assert_eq!(b.controller.timer().arm_calls(), 0);
    assert!(!b.led(0), "toggle channel must not disturb its neighbour");
}

#[test]
fn active_low_sensor_is_inverted() {
    let mut pins = ChannelConfig::timed(4, 38);
    pins.sensor_active_high = false;
    let config = ControllerConfig::with_channels(QUIET_MS, &[pins]).unwrap();
    let b = Bench::with_config(&config);

    // Line low = motion.
    b.sense(0, false);
    assert!(b.led(0));
    assert!(!b.armed(0));

    b.sense(0, true);
    assert!(b.armed(0));
    b.at(secs(3));
    assert!(!b.led(0));
}

// ── Runtime faults ────────────────────────────────────────────

#[test]
fn failed_write_keeps_last_output_and_reports() {
    let b = five_channels();
    b.wiring.output(1).set_failing(true);
    b.sense(1, true);

    assert!(!b.led(1));
    assert!(!b.controller.output_is_on(1));
    assert!(b.sink().for_channel(1).iter().any(|e| matches!(e, ChannelEvent::Fault { .. })));

    // The next event goes through once the line recovers.
    b.wiring.output(1).set_failing(false);
    b.sense(1, true);
    assert!(b.led(1));
    assert_eq!(b.controller.snapshot(1).unwrap().stats.faults, 1);
}

#[test]
fn unknown_channel_is_ignored() {
    let b = five_channels();
    b.controller.on_edge(7);
    b.controller.on_timer_fired(200);
    assert!(b.controller.snapshots().all(|s| !s.output_on && !s.timer.is_armed()));
}
