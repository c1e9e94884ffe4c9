// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_advances() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}

#[test]
fn system_clock_epoch_is_plausible() {
    let clock = SystemClock;
    // After 2020-01-01 in both units
    assert!(clock.epoch_ms() > 1_577_836_800_000);
    assert!(clock.epoch_secs() > 1_577_836_800);
}

#[test]
fn fake_clock_advance_moves_both_timelines() {
    let clock = FakeClock::new();
    let start = clock.now();
    let start_ms = clock.epoch_ms();

    clock.advance(Duration::from_millis(1500));

    assert_eq!(clock.now() - start, Duration::from_millis(1500));
    assert_eq!(clock.epoch_ms() - start_ms, 1500);
}

#[test]
fn fake_clock_set_epoch_ms() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(42_000);
    assert_eq!(clock.epoch_ms(), 42_000);
    assert_eq!(clock.epoch_secs(), 42);
}

#[test]
fn fake_clock_clones_share_state() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance(Duration::from_secs(5));
    assert_eq!(other.epoch_ms(), clock.epoch_ms());
}
