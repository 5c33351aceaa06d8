// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use uspa_core::{EndpointId, Event};

fn ep() -> EndpointId {
    EndpointId::new("os::00D2E5-RTR-001")
}

#[test]
fn subscription_created_is_idempotent() {
    let mut state = MaterializedState::default();
    let event = Event::SubscriptionCreated { subscription_id: "sub-1".into(), controller: ep() };
    apply(&mut state, &event);
    apply(&mut state, &event);
    assert_eq!(state.subscriptions.len(), 1);
}

#[test]
fn notify_sent_tracks_pending_and_high_water_mark() {
    let mut state = MaterializedState::default();
    apply(
        &mut state,
        &Event::NotifySent { controller: ep(), message_id: 3, kind: "ValueChange".into() },
    );
    assert_eq!(state.notify_counters.get(ep().as_str()), Some(&3));
    assert_eq!(state.pending_notifies.len(), 1);
}

#[test]
fn notify_acked_clears_pending_entry() {
    let mut state = MaterializedState::default();
    apply(&mut state, &Event::NotifySent { controller: ep(), message_id: 1, kind: "ValueChange".into() });
    apply(&mut state, &Event::NotifyAcked { controller: ep(), message_id: 1 });
    assert!(state.pending_notifies.is_empty());
}

#[test]
fn notify_retry_then_expiry_updates_pending_state() {
    let mut state = MaterializedState::default();
    apply(&mut state, &Event::NotifySent { controller: ep(), message_id: 1, kind: "ValueChange".into() });
    apply(&mut state, &Event::NotifyRetryScheduled { controller: ep(), message_id: 1, attempt: 2 });
    let key = pending_key(ep().as_str(), 1);
    assert_eq!(state.pending_notifies.get(&key).unwrap().attempt, 2);

    apply(&mut state, &Event::NotifyExpired { controller: ep(), message_id: 1 });
    assert!(matches!(
        state.pending_notifies.get(&key).unwrap().state,
        PendingNotifyState::Expired
    ));
}
