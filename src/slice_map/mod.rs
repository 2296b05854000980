//! Slice multiplexer.
//!
//! A [`SliceMap`] lazily creates one [`crate::Slice`] per distinct argument
//! value and forwards actions and accessors to it:
//!
//! ```text
//! state["@@rags/map"]["users/3"]
//! ├── "[1]"   -> slice for args (1,)
//! └── "[2]"   -> slice for args (2,)
//! ```
//!
//! Keys are the canonical JSON of the arguments.

mod descriptor;
mod key;
mod multiplexer;

pub use descriptor::SliceMapDescriptor;
pub use key::{args_key, canonical_json};
pub use multiplexer::SliceMap;
