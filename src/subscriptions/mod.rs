//! Subscription system for store change notifications.
//!
//! A [`crate::Store`] broadcasts every dispatched event and every reducer
//! replacement to its subscribers:
//! - Filtering by exact event kind or kind prefix
//! - Bounded buffers with slow-subscriber dropping (dispatch never blocks)
//!
//! # Example
//!
//! ```ignore
//! let handle = store.subscribe(SubscriptionConfig {
//!     filter: SubscriptionFilter::kind_prefix(slice.event_prefix()),
//!     ..Default::default()
//! });
//!
//! while let Ok(StoreEvent::Dispatched { event }) = handle.recv() {
//!     println!("slice saw {}", event.kind);
//! }
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, StoreEvent, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId,
};
