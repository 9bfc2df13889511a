//! Per-connection subscription manager.
//!
//! Tracks which users a WebSocket client follows and filters
//! [`WalletEvent`]s server-side.

use std::collections::HashSet;

use crate::domain::{UserId, WalletEvent};

/// Manages the set of user subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Followed users. Ignored while `subscribe_all` is set.
    user_ids: HashSet<UserId>,
    /// Wildcard `"*"`: every event, including contest-level ones.
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds users to the subscription set and optionally enables the
    /// wildcard.
    pub fn subscribe(&mut self, ids: &[UserId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.user_ids.extend(ids.iter().copied());
    }

    /// Removes users from the subscription set.
    pub fn unsubscribe(&mut self, ids: &[UserId]) {
        for id in ids {
            self.user_ids.remove(id);
        }
    }

    /// Returns `true` if the event passes this connection's filter.
    #[must_use]
    pub fn matches(&self, event: &WalletEvent) -> bool {
        if self.subscribe_all {
            return true;
        }
        event
            .user_id()
            .is_some_and(|user_id| self.user_ids.contains(&user_id))
    }

    /// Returns the number of explicitly followed users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.user_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
