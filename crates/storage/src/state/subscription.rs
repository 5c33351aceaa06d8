// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription engine event handlers: subscription lifecycle, per-controller
//! monotonic Notify message IDs, and redelivery tracking.

use uspa_core::Event;

use super::helpers::epoch_ms_now;
use super::types::{PendingNotify, PendingNotifyState, SubscriptionRecord};
use super::MaterializedState;

fn pending_key(controller: &str, message_id: u64) -> String {
    format!("{controller}:{message_id}")
}

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::SubscriptionCreated { subscription_id, controller } => {
            state.subscriptions.entry(subscription_id.clone()).or_insert_with(|| SubscriptionRecord {
                subscription_id: subscription_id.clone(),
                controller: controller.clone(),
                created_at_ms: epoch_ms_now(),
            });
        }

        Event::SubscriptionDeleted { subscription_id } => {
            state.subscriptions.remove(subscription_id);
        }

        Event::NotifySent { controller, message_id, kind } => {
            let counter = state.notify_counters.entry(controller.to_string()).or_insert(0);
            if *message_id > *counter {
                *counter = *message_id;
            }
            state.pending_notifies.entry(pending_key(controller.as_str(), *message_id)).or_insert_with(|| {
                PendingNotify {
                    controller: controller.clone(),
                    message_id: *message_id,
                    kind: kind.clone(),
                    attempt: 0,
                    state: PendingNotifyState::Sent,
                }
            });
        }

        Event::NotifyAcked { controller, message_id } => {
            state.pending_notifies.remove(&pending_key(controller.as_str(), *message_id));
        }

        Event::NotifyRetryScheduled { controller, message_id, attempt } => {
            if let Some(pending) = state.pending_notifies.get_mut(&pending_key(controller.as_str(), *message_id)) {
                pending.attempt = *attempt;
                pending.state = PendingNotifyState::RetryScheduled;
            }
        }

        Event::NotifyExpired { controller, message_id } => {
            if let Some(pending) = state.pending_notifies.get_mut(&pending_key(controller.as_str(), *message_id)) {
                pending.state = PendingNotifyState::Expired;
            }
        }

        Event::OperationCompleted { .. } => {
            // The async-Operate bookkeeping this closes out lives on the
            // engine's in-memory command-key table; nothing durable to apply.
        }

        _ => {}
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
