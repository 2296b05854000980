//! Subscription types for store change notifications.

use crate::types::Event;
use serde::{Deserialize, Serialize};

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping subscriber.
    /// Default: 1000
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: SubscriptionFilter,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            filter: SubscriptionFilter::all(),
        }
    }
}

/// Filter criteria for subscriptions.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionFilter {
    /// Only these exact event kinds (None = all kinds).
    pub kinds: Option<Vec<String>>,

    /// Only event kinds starting with this prefix.
    pub kind_prefix: Option<String>,

    /// Include dispatched events.
    pub include_dispatches: bool,

    /// Include reducer replacements.
    pub include_replacements: bool,
}

impl SubscriptionFilter {
    /// Subscribe to every dispatched event.
    pub fn dispatches() -> Self {
        Self {
            include_dispatches: true,
            ..Default::default()
        }
    }

    /// Subscribe to specific event kinds.
    pub fn kinds(kinds: Vec<String>) -> Self {
        Self {
            kinds: Some(kinds),
            include_dispatches: true,
            ..Default::default()
        }
    }

    /// Subscribe to event kinds sharing a prefix.
    pub fn kind_prefix(prefix: impl Into<String>) -> Self {
        Self {
            kind_prefix: Some(prefix.into()),
            include_dispatches: true,
            ..Default::default()
        }
    }

    /// Subscribe to reducer replacements.
    pub fn replacements() -> Self {
        Self {
            include_replacements: true,
            ..Default::default()
        }
    }

    /// Subscribe to everything.
    pub fn all() -> Self {
        Self {
            include_dispatches: true,
            include_replacements: true,
            ..Default::default()
        }
    }

    pub(crate) fn matches_event(&self, event: &Event) -> bool {
        if !self.include_dispatches {
            return false;
        }
        if let Some(ref kinds) = self.kinds {
            if !kinds.iter().any(|k| *k == event.kind) {
                return false;
            }
        }
        if let Some(ref prefix) = self.kind_prefix {
            if !event.kind.starts_with(prefix.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Events emitted by subscriptions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// An event ran through the root reducer.
    Dispatched { event: Event },

    /// The root reducer was replaced (a slice was injected).
    ReducerReplaced,

    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to manage a subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<StoreEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<StoreEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<StoreEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<StoreEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Kinds of the dispatched events received so far, in order.
    pub fn drain_kinds(&self) -> Vec<String> {
        self.receiver
            .try_iter()
            .filter_map(|event| match event {
                StoreEvent::Dispatched { event } => Some(event.kind),
                _ => None,
            })
            .collect()
    }
}
