//! Edge handler vs. timer callback interleavings on one channel.
//!
//! Both run inside the channel's critical section, so the outcome is
//! decided by which one enters first.

use std::thread;

use motionlamp::app::events::ChannelEvent;
use motionlamp::channel::OffTimer;

use crate::mock_hw::{Bench, QUIET_MS, secs};

#[test]
fn fire_after_cancel_is_stale() {
    let b = Bench::new(1);
    b.sense(0, true);
    b.sense(0, false);

    // The driver already popped the fire when the active edge landed.
    b.controller.timer().set_now(secs(3));
    b.sense(0, true);
    b.controller.on_timer_fired(0);

    assert!(b.led(0));
    assert!(!b.armed(0));
    let snap = b.controller.snapshot(0).unwrap();
    assert_eq!(snap.stats.stale_fires, 1);
    assert_eq!(snap.stats.timed_offs, 0);
    assert!(
        b.sink()
            .for_channel(0)
            .contains(&ChannelEvent::StaleFire { channel: 0 })
    );
}

#[test]
fn fire_for_superseded_arm_is_stale() {
    let b = Bench::new(1);
    b.sense(0, false);
    b.controller.timer().set_now(secs(2));
    b.sense(0, false);

    // The first arm's fire arrives late, after the re-arm to t=5.
    b.controller.timer().set_now(secs(3));
    b.controller.on_timer_fired(0);
    assert_eq!(
        b.controller.snapshot(0).unwrap().timer,
        OffTimer::Armed {
            deadline_ms: secs(2) + u64::from(QUIET_MS)
        }
    );

    b.sense(0, true);
    b.sense(0, false);
    b.at(secs(6));
    assert!(!b.led(0));
    assert_eq!(b.sink().timed_offs(0), 1);
}

#[test]
fn fire_that_entered_first_wins_until_next_active() {
    let b = Bench::new(1);
    b.sense(0, true);
    b.sense(0, false);

    b.at(secs(3));
    assert!(!b.led(0));

    b.sense(0, true);
    assert!(b.led(0));
    assert!(!b.armed(0));
}

#[test]
fn failed_cancel_still_ignores_late_fire() {
    let b = Bench::new(1);
    b.sense(0, false);

    b.controller.timer().set_failing(true);
    b.sense(0, true);
    b.controller.timer().set_now(secs(3));
    b.controller.on_timer_fired(0);

    assert!(b.led(0));
    let stats = b.controller.snapshot(0).unwrap().stats;
    assert_eq!(stats.faults, 1);
    assert_eq!(stats.stale_fires, 1);
}

#[test]
fn failed_arm_leaves_output_on() {
    let b = Bench::new(1);
    b.sense(0, true);
    b.controller.timer().set_failing(true);
    b.sense(0, false);

    assert!(!b.armed(0));
    b.controller.timer().set_failing(false);
    b.at(secs(60));
    assert!(b.led(0));
}

#[test]
fn concurrent_fires_never_undo_an_active_edge() {
    const EDGES: u32 = 2_000;
    let b = Bench::new(2);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..EDGES {
                let active = i % 2 == 0;
                b.sense(0, active);
                if active {
                    // Cancelled before any fire could enter: must hold.
                    assert!(b.controller.output_is_on(0), "edge {i}");
                    assert!(!b.armed(0), "edge {i}");
                }
            }
        });
        s.spawn(|| {
            for _ in 0..EDGES {
                b.controller.advance_by(1_000);
                b.controller.on_timer_fired(0);
            }
        });
        s.spawn(|| {
            for i in 0..EDGES {
                b.sense(1, i % 3 != 0);
            }
        });
    });

    let stats = b.controller.snapshot(0).unwrap().stats;
    assert_eq!(stats.activations, EDGES / 2);
    assert_eq!(stats.faults, 0);

    // Last edge was inactive: exactly one more off at most.
    let before = stats.timed_offs;
    b.controller.advance_by(u64::from(QUIET_MS));
    let snap = b.controller.snapshot(0).unwrap();
    assert!(!snap.output_on);
    assert!(!snap.timer.is_armed());
    assert!(snap.stats.timed_offs - before <= 1);
}
