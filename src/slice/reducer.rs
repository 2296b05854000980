//! The transition function of one slice.

use crate::types::{Event, PartialReducer, SliceMeta, SliceState, Timestamp};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Event kinds owned by one slice.
///
/// Kinds embed the root namespace and the slice's generation, so slices
/// with the same name never react to each other's events.
#[derive(Clone, Debug)]
pub struct EventKinds {
    prefix: String,
    pub begin_loading: String,
    pub end_loading: String,
    pub errors: String,
    pub clear_errors: String,
    pub update: String,
    pub reset: String,
}

impl EventKinds {
    pub fn new(namespace: &str, generation: u64, name: &str) -> Self {
        let prefix = format!("{}/{}/{}: ", namespace, generation, name);
        Self {
            begin_loading: format!("{}begin loading", prefix),
            end_loading: format!("{}end loading", prefix),
            errors: format!("{}errors", prefix),
            clear_errors: format!("{}clear errors", prefix),
            update: format!("{}update", prefix),
            reset: format!("{}reset", prefix),
            prefix,
        }
    }

    /// Common prefix of every kind in this set.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn classify(&self, kind: &str) -> Option<Transition> {
        if !kind.starts_with(self.prefix.as_str()) {
            return None;
        }
        if kind == self.begin_loading {
            Some(Transition::BeginLoading)
        } else if kind == self.end_loading {
            Some(Transition::EndLoading)
        } else if kind == self.errors {
            Some(Transition::SetErrors)
        } else if kind == self.clear_errors {
            Some(Transition::ClearErrors)
        } else if kind == self.update {
            Some(Transition::SetData)
        } else if kind == self.reset {
            Some(Transition::Reset)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transition {
    BeginLoading,
    EndLoading,
    SetErrors,
    ClearErrors,
    SetData,
    Reset,
}

/// Produces the encoded data of a fresh slice.
pub(crate) type InitialValue = Arc<dyn Fn() -> Value + Send + Sync>;

/// Pure transition function over the encoded [`SliceState`].
///
/// Holds nothing but what the transition needs, so the composed root
/// reducer never keeps a slice's loader or its composition root alive.
pub struct SliceReducer {
    name: String,
    kinds: EventKinds,
    initial_data: InitialValue,
    partial: Option<Arc<dyn PartialReducer>>,
}

impl SliceReducer {
    pub(crate) fn new(
        name: String,
        kinds: EventKinds,
        initial_data: InitialValue,
        partial: Option<Arc<dyn PartialReducer>>,
    ) -> Self {
        Self {
            name,
            kinds,
            initial_data,
            partial,
        }
    }

    pub fn kinds(&self) -> &EventKinds {
        &self.kinds
    }

    /// A freshly produced initial state.
    pub fn initial_state(&self) -> SliceState {
        let data = (self.initial_data)();
        SliceState::initial(if data.is_null() { None } else { Some(data) })
    }

    pub fn initial_value(&self) -> Value {
        self.initial_state().into_value()
    }

    /// Apply `event` to `state`. Total: unknown events leave state unchanged.
    pub fn apply(&self, state: Option<&Value>, event: &Event) -> Value {
        let Some(transition) = self.kinds.classify(&event.kind) else {
            return self.apply_foreign(state, event);
        };

        match transition {
            Transition::Reset => self.initial_value(),
            Transition::BeginLoading => self.edit(state, |s| s.meta.loading = true),
            Transition::EndLoading => self.edit(state, |s| s.meta.loading = false),
            Transition::SetErrors => self.edit(state, |s| s.meta.errors = Some(event.payload.clone())),
            Transition::ClearErrors => self.edit(state, |s| s.meta.errors = None),
            Transition::SetData => self.edit(state, |s| {
                s.data = non_null(&event.payload);
                s.meta = SliceMeta {
                    loading: false,
                    loaded: true,
                    change_count: s.meta.change_count + 1,
                    last_change_time: Some(Timestamp::now()),
                    errors: None,
                };
            }),
        }
    }

    fn edit(&self, state: Option<&Value>, f: impl FnOnce(&mut SliceState)) -> Value {
        let mut next = self.decode(state);
        f(&mut next);
        next.into_value()
    }

    fn apply_foreign(&self, state: Option<&Value>, event: &Event) -> Value {
        let Some(partial) = &self.partial else {
            return match state {
                Some(value) => value.clone(),
                None => self.initial_value(),
            };
        };

        let mut current = self.decode(state);
        match partial.reduce(&current, event) {
            Some(update) => {
                if let Some(data) = update.data {
                    current.data = non_null(&data);
                }
                if let Some(meta) = update.meta {
                    current.meta = meta;
                }
                current.into_value()
            }
            None => match state {
                Some(value) => value.clone(),
                None => current.into_value(),
            },
        }
    }

    fn decode(&self, state: Option<&Value>) -> SliceState {
        match state {
            Some(value) if !value.is_null() => serde_json::from_value(value.clone())
                .unwrap_or_else(|err| {
                    warn!(slice = %self.name, error = %err, "slice state is malformed, starting from initial state");
                    self.initial_state()
                }),
            _ => self.initial_state(),
        }
    }
}

fn non_null(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => Some(other.clone()),
    }
}
