// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn delay_grows_exponentially_before_the_cap() {
    let policy = BackoffPolicy::stomp_reconnect();
    let d1 = policy.delay_for_attempt(1, 0.0);
    let d2 = policy.delay_for_attempt(2, 0.0);
    let d3 = policy.delay_for_attempt(3, 0.0);
    assert!(d1 < d2);
    assert!(d2 < d3);
}

#[test]
fn delay_saturates_at_cap() {
    let policy = BackoffPolicy::stomp_reconnect();
    let far = policy.delay_for_attempt(100, 0.0);
    assert!(far.as_secs_f64() <= policy.cap.as_secs_f64() * 1.0 + 1.0);
}

#[test]
fn jitter_keeps_delay_within_half_to_full_of_raw() {
    let policy = BackoffPolicy::new(
        Duration::from_secs(10),
        1.0,
        Duration::from_secs(10),
        Duration::from_secs(100),
    );
    let low = policy.delay_for_attempt(1, 0.0);
    let high = policy.delay_for_attempt(1, 0.999);
    assert!(low.as_secs_f64() >= 5.0);
    assert!(high.as_secs_f64() <= 10.0);
    assert!(low <= high);
}

#[test]
fn expiry_is_bounded_by_max_elapsed() {
    let policy = BackoffPolicy::stomp_reconnect();
    assert!(!policy.is_expired(Duration::from_secs(10)));
    assert!(policy.is_expired(Duration::from_secs(3600)));
}
