//! Root composition primitive.

use crate::types::{Event, Reducer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Combines a mapping of key → reducer into one reducer over an object.
pub type CombineFn = Arc<dyn Fn(BTreeMap<String, Reducer>) -> Reducer + Send + Sync>;

/// Default composition primitive.
///
/// The combined reducer produces an object with exactly one field per key;
/// each field is computed by that key's reducer from the matching field of
/// the incoming state and the same event. Fields of the incoming state
/// without a reducer are dropped.
pub fn combine_reducers(reducers: BTreeMap<String, Reducer>) -> Reducer {
    Arc::new(move |state: Option<&Value>, event: &Event| {
        let mut next = Map::new();
        for (key, reducer) in &reducers {
            let current = state.and_then(|s| s.get(key.as_str()));
            next.insert(key.clone(), reducer(current, event));
        }
        Value::Object(next)
    })
}

/// How the injector turns its tree into the container's root reducer.
#[derive(Clone)]
pub struct Composition {
    /// Composition primitive applied at every interior node.
    pub combine: CombineFn,

    /// Fixed top-level reducers combined alongside the dynamic tree.
    /// A dynamic key with the same name wins.
    pub static_reducers: BTreeMap<String, Reducer>,
}

impl Composition {
    /// Default primitive plus the given static reducers.
    pub fn with_static_reducers(static_reducers: BTreeMap<String, Reducer>) -> Self {
        Self {
            static_reducers,
            ..Default::default()
        }
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self {
            combine: Arc::new(combine_reducers),
            static_reducers: BTreeMap::new(),
        }
    }
}
