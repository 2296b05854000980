//! Core types for slices and the composed state tree.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Kind of the event a [`crate::Store`] runs when it is created.
pub const INIT_EVENT: &str = "@@rags/INIT";

/// Kind of the event a [`crate::Store`] runs after its reducer is replaced.
pub const REPLACE_EVENT: &str = "@@rags/REPLACE";

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time. Clocks set before the epoch read as zero.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        Timestamp(micros)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// A tagged payload describing one requested state transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    /// Create an event with a payload.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Create an event without a payload.
    pub fn bare(kind: impl Into<String>) -> Self {
        Self::new(kind, Value::Null)
    }

    pub fn init() -> Self {
        Self::bare(INIT_EVENT)
    }

    pub fn replace() -> Self {
        Self::bare(REPLACE_EVENT)
    }
}

/// Pure transition function `(state, event) -> next state`.
///
/// `None` means the tree holds nothing at this position yet; the reducer
/// answers with its initial state.
pub type Reducer = Arc<dyn Fn(Option<&Value>, &Event) -> Value + Send + Sync>;

/// Wrap a closure as a [`Reducer`].
pub fn reducer<F>(f: F) -> Reducer
where
    F: Fn(Option<&Value>, &Event) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Lifecycle flags of one slice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "E: Serialize", deserialize = "E: Deserialize<'de>"))]
pub struct SliceMeta<E = Value> {
    pub loading: bool,
    pub loaded: bool,
    /// Successful data commits since the last reset.
    pub change_count: u64,
    pub last_change_time: Option<Timestamp>,
    /// Last failure, stored as `{"value": ...}` so a failure encoding to
    /// `null` is still recorded.
    #[serde(
        default,
        with = "errors_slot"
    )]
    pub errors: Option<E>,
}

mod errors_slot {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct Slot<'a, E> {
        value: &'a E,
    }

    #[derive(Deserialize)]
    struct OwnedSlot<E> {
        value: E,
    }

    pub fn serialize<E: Serialize, S: Serializer>(
        errors: &Option<E>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match errors {
            Some(value) => serializer.serialize_some(&Slot { value }),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, E, D>(deserializer: D) -> Result<Option<E>, D::Error>
    where
        E: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Ok(Option::<OwnedSlot<E>>::deserialize(deserializer)?.map(|slot| slot.value))
    }
}

impl<E> Default for SliceMeta<E> {
    fn default() -> Self {
        Self {
            loading: false,
            loaded: false,
            change_count: 0,
            last_change_time: None,
            errors: None,
        }
    }
}

/// State held by one slice: its data plus lifecycle metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliceState<T = Value, E = Value> {
    pub data: Option<T>,
    pub meta: SliceMeta<E>,
}

impl<T, E> SliceState<T, E> {
    /// Fresh state: given data, nothing loaded, no errors.
    pub fn initial(data: Option<T>) -> Self {
        Self {
            data,
            meta: SliceMeta::default(),
        }
    }
}

impl SliceState<Value, Value> {
    /// Encode as the JSON object stored in the tree.
    pub fn into_value(self) -> Value {
        let SliceMeta {
            loading,
            loaded,
            change_count,
            last_change_time,
            errors,
        } = self.meta;

        let mut meta = Map::new();
        meta.insert("loading".into(), Value::Bool(loading));
        meta.insert("loaded".into(), Value::Bool(loaded));
        meta.insert("change_count".into(), Value::from(change_count));
        meta.insert(
            "last_change_time".into(),
            last_change_time.map_or(Value::Null, |t| Value::from(t.0)),
        );
        let errors = errors.map_or(Value::Null, |value| {
            let mut slot = Map::new();
            slot.insert("value".into(), value);
            Value::Object(slot)
        });
        meta.insert("errors".into(), errors);

        let mut state = Map::new();
        state.insert("data".into(), self.data.unwrap_or(Value::Null));
        state.insert("meta".into(), Value::Object(meta));
        Value::Object(state)
    }
}

/// Partial state returned by a [`PartialReducer`].
///
/// Fields that are `Some` replace the matching field of the current state;
/// `data: Some(Value::Null)` clears the data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialState {
    pub data: Option<Value>,
    pub meta: Option<SliceMeta>,
}

/// Handler for events a slice does not own.
///
/// Runs only in the default branch of a slice's transition function. The
/// result is shallow-merged over the current state; `None` keeps it as is.
pub trait PartialReducer: Send + Sync {
    fn reduce(&self, state: &SliceState, event: &Event) -> Option<PartialState>;
}

impl<F> PartialReducer for F
where
    F: Fn(&SliceState, &Event) -> Option<PartialState> + Send + Sync,
{
    fn reduce(&self, state: &SliceState, event: &Event) -> Option<PartialState> {
        self(state, event)
    }
}
