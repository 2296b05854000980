//! # Rags
//!
//! Asynchronously loaded state slices, grafted at runtime into one composed
//! state tree.
//!
//! ## Core Concepts
//!
//! - **Slices**: a unit of state with `data`, lifecycle `meta`, and async load/update
//! - **Injection**: transition functions grafted into a live reducer tree by path
//! - **Slice maps**: one slice per distinct argument value, created on first use
//! - **Containers**: the store the composed root reducer runs in
//!
//! ## Example
//!
//! ```ignore
//! use rags::{Composition, Rags, RagsConfig, SliceDescriptor, Store};
//!
//! let store = Arc::new(Store::default());
//! let rags = Rags::new(RagsConfig::default());
//! rags.configure(store.clone(), Composition::default());
//!
//! let numbers = rags.slice(SliceDescriptor::<i64>::new("numbers").loader_fn(|()| Ok(10)));
//! numbers.load(()).await;
//!
//! let state = store.state();
//! assert_eq!(numbers.get_data(&state), Some(10));
//! assert!(numbers.get_meta(&state).loaded);
//! ```

pub mod error;
pub mod injector;
pub mod rags;
pub mod slice;
pub mod slice_map;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{RagsError, Result};
pub use injector::{combine_reducers, CombineFn, Composition, PathInjector, ReducerNode, ReducerTree};
pub use rags::{Rags, RagsConfig};
pub use slice::{EventKinds, InitialData, Loader, Locator, Placement, Slice, SliceDescriptor, SliceReducer, Updater};
pub use slice_map::{args_key, canonical_json, SliceMap, SliceMapDescriptor};
pub use store::{Container, Store};
pub use subscriptions::{
    DropReason, StoreEvent, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle, SubscriptionId,
    SubscriptionManager,
};
pub use types::*;
