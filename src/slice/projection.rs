//! Typed field projection off a located substate.
//!
//! A substate missing `data` or `meta` means the slice's locator points at
//! the wrong place. That is reported as a warning and answered with an
//! empty result; accessors never fail.

use crate::types::SliceMeta;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

pub(crate) fn project_data<T: DeserializeOwned>(substate: &Value, slice: &str) -> Option<T> {
    let Some(data) = substate.get("data") else {
        warn!(
            slice,
            "get_data found no `data` field on the located state; the slice locator is likely misconfigured"
        );
        return None;
    };
    if data.is_null() {
        return None;
    }
    serde_json::from_value(data.clone())
        .map_err(|err| warn!(slice, error = %err, "slice data does not decode into the requested type"))
        .ok()
}

pub(crate) fn project_meta<E: DeserializeOwned>(substate: &Value, slice: &str) -> SliceMeta<E> {
    let Some(meta) = substate.get("meta") else {
        warn!(
            slice,
            "get_meta found no `meta` field on the located state; the slice locator is likely misconfigured"
        );
        return SliceMeta::default();
    };
    serde_json::from_value(meta.clone()).unwrap_or_else(|err| {
        warn!(slice, error = %err, "slice meta does not decode");
        SliceMeta::default()
    })
}

/// Encode the data a fresh slice starts with; `Null` when there is none.
pub(crate) fn encode_initial<T: Serialize>(data: Option<T>, slice: &str) -> Value {
    match data.map(|d| serde_json::to_value(d)) {
        None => Value::Null,
        Some(Ok(value)) => value,
        Some(Err(err)) => {
            warn!(slice, error = %err, "initial data does not encode, starting empty");
            Value::Null
        }
    }
}
