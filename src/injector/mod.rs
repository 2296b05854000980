//! Path-keyed injection of reducers into a live composed tree.
//!
//! Reducers are grafted into a trie keyed by path segment. After every
//! injection the whole trie is recomposed bottom-up into one root reducer
//! and installed into the host container:
//!
//! ```text
//! ["@@rags", "numbers/1"]          root ──┬── "@@rags" ──┬── "numbers/1"  (leaf)
//! ["@@rags", "users/2"]                   │             └── "users/2"    (leaf)
//! ["@@rags/map", "todo/3", "[1]"]         └── "@@rags/map" ── "todo/3" ── "[1]" (leaf)
//! ```

mod combine;
mod path;
mod tree;

pub use combine::{combine_reducers, CombineFn, Composition};
pub use path::PathInjector;
pub use tree::{ReducerNode, ReducerTree};
