//! Host state container.
//!
//! Slices never own state: they describe transitions and read from whatever
//! container the composition root is bound to. [`Container`] is the contract
//! they consume; [`Store`] is an in-process implementation of it.

use crate::subscriptions::{SubscriptionConfig, SubscriptionHandle, SubscriptionId, SubscriptionManager};
use crate::types::{reducer, Event, Reducer};
use parking_lot::Mutex;
use serde_json::{Map, Value};

/// What the slice machinery needs from a state container.
///
/// Implementations must serialize `dispatch` and `replace_reducer`: a
/// dispatch observes either the old root reducer or the new one, never a
/// mixture.
pub trait Container: Send + Sync {
    /// Run `event` through the root reducer.
    fn dispatch(&self, event: Event);

    /// Current composed state.
    fn state(&self) -> Value;

    /// Swap the root reducer.
    fn replace_reducer(&self, reducer: Reducer);
}

struct StoreInner {
    state: Value,
    reducer: Reducer,
}

/// In-process state container.
///
/// A single mutex serializes dispatches and reducer swaps. Reducers run
/// under that lock and must not dispatch.
pub struct Store {
    inner: Mutex<StoreInner>,
    subscriptions: SubscriptionManager,
}

impl Store {
    /// Create a store whose initial state is `reducer(None, init)`.
    pub fn new(reducer: Reducer) -> Self {
        let state = reducer(None, &Event::init());
        Self::from_parts(state, reducer)
    }

    /// Create a store from preloaded state.
    pub fn with_state(reducer: Reducer, preloaded: Value) -> Self {
        let state = reducer(Some(&preloaded), &Event::init());
        Self::from_parts(state, reducer)
    }

    fn from_parts(state: Value, reducer: Reducer) -> Self {
        Self {
            inner: Mutex::new(StoreInner { state, reducer }),
            subscriptions: SubscriptionManager::new(),
        }
    }

    /// Run `event` through the root reducer and notify subscribers.
    pub fn dispatch(&self, event: Event) {
        let mut inner = self.inner.lock();
        let next = (inner.reducer)(Some(&inner.state), &event);
        inner.state = next;
        // Broadcast under the lock so subscribers see dispatch order.
        self.subscriptions.broadcast_dispatch(&event);
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> Value {
        self.inner.lock().state.clone()
    }

    /// Read the current state without cloning it.
    pub fn with_state_ref<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.inner.lock().state)
    }

    /// Swap the root reducer and run the replace event through it.
    pub fn replace_reducer(&self, reducer: Reducer) {
        let mut inner = self.inner.lock();
        let next = reducer(Some(&inner.state), &Event::replace());
        inner.state = next;
        inner.reducer = reducer;
        self.subscriptions.broadcast_replaced();
    }

    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        self.subscriptions.subscribe(config)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.unsubscribe(id);
    }
}

impl Default for Store {
    /// Store with an identity root reducer over an empty object.
    fn default() -> Self {
        Self::new(reducer(|state, _| {
            state.cloned().unwrap_or_else(|| Value::Object(Map::new()))
        }))
    }
}

impl Container for Store {
    fn dispatch(&self, event: Event) {
        Store::dispatch(self, event);
    }

    fn state(&self) -> Value {
        Store::state(self)
    }

    fn replace_reducer(&self, reducer: Reducer) {
        Store::replace_reducer(self, reducer);
    }
}
