//! Slice lifecycle.
//!
//! A slice is built from a [`SliceDescriptor`] and owns:
//! - Action constructors (`begin_loading`, `set_data`, `reset`, ...)
//! - A pure transition function ([`SliceReducer`]) over its substate
//! - Asynchronous `load` / `update` that dispatch through the bound container
//! - Accessors reading its substate out of the composed state
//!
//! # Example
//!
//! ```ignore
//! let numbers = rags.slice(
//!     SliceDescriptor::<i64>::new("numbers").loader_fn(|()| Ok(10)),
//! );
//! numbers.load(()).await;
//! assert_eq!(numbers.get_data(&store.state()), Some(10));
//! ```

mod descriptor;
mod lifecycle;
mod projection;
mod reducer;

pub use descriptor::{InitialData, Loader, Locator, Placement, SliceDescriptor, Updater};
pub use lifecycle::Slice;
pub(crate) use projection::{encode_initial, project_data, project_meta};
pub use reducer::{EventKinds, SliceReducer};
