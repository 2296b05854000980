//! A slice: action constructors, asynchronous load/update, accessors.

use super::descriptor::{InitialData, Loader, Placement, SliceDescriptor, Updater};
use super::projection::{encode_initial, project_data, project_meta};
use super::reducer::{EventKinds, InitialValue, SliceReducer};
use crate::error::Result;
use crate::rags::Rags;
use crate::store::Container;
use crate::types::{Event, Reducer, SliceMeta, SliceState};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

struct SliceInner<T, A, U, E> {
    rags: Arc<Rags>,
    unique_name: String,
    transitions: Arc<SliceReducer>,
    placement: Placement,
    loader: Option<Loader<T, A, E>>,
    updater: Option<Updater<T, U, E>>,
    load_only_once: bool,
}

/// One self-contained unit of asynchronously loaded state.
///
/// Cheap to clone; clones share the same underlying slice. Effects of
/// `load` and `update` are expressed purely as dispatched events: loader
/// and updater failures land in `meta.errors`, they are never returned.
pub struct Slice<T, A = (), U = (), E = String> {
    inner: Arc<SliceInner<T, A, U, E>>,
}

impl<T, A, U, E> Clone for Slice<T, A, U, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Dispatches `END_LOADING` when dropped, whichever way `load` exits.
struct FinishLoading<'a> {
    container: &'a dyn Container,
    event: Option<Event>,
}

impl Drop for FinishLoading<'_> {
    fn drop(&mut self) {
        if let Some(event) = self.event.take() {
            self.container.dispatch(event);
        }
    }
}

impl<T, A, U, E> Slice<T, A, U, E>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    A: Send + 'static,
    U: Send + 'static,
    E: Serialize + DeserializeOwned + Send + 'static,
{
    pub(crate) fn build(rags: &Arc<Rags>, descriptor: SliceDescriptor<T, A, U, E>) -> Self {
        let SliceDescriptor {
            name,
            loader,
            updater,
            partial_reducer,
            placement,
            initial_data,
            load_only_once,
        } = descriptor;

        let generation = rags.next_generation();
        let unique_name = format!("{}/{}", name, generation);
        let namespace = rags.config().namespace.clone();

        let kinds = EventKinds::new(&namespace, generation, &name);
        let initial = initial_value(initial_data, unique_name.clone());
        let transitions = Arc::new(SliceReducer::new(
            unique_name.clone(),
            kinds,
            initial,
            partial_reducer,
        ));

        let (placement, register) = match placement {
            Some(placement) => (placement, false),
            None => (Placement::Path(vec![namespace, unique_name.clone()]), true),
        };

        let slice = Self {
            inner: Arc::new(SliceInner {
                rags: Arc::clone(rags),
                unique_name,
                transitions,
                placement,
                loader,
                updater,
                load_only_once,
            }),
        };

        if register {
            if let Placement::Path(path) = &slice.inner.placement {
                if let Err(err) = rags.injector().inject(path, slice.reducer()) {
                    error!(slice = %slice.inner.unique_name, error = %err, "failed to register slice");
                }
            }
        }
        slice
    }

    // --- Actions ---

    pub fn begin_loading(&self) -> Event {
        Event::bare(&self.kinds().begin_loading)
    }

    pub fn end_loading(&self) -> Event {
        Event::bare(&self.kinds().end_loading)
    }

    pub fn reset(&self) -> Event {
        Event::bare(&self.kinds().reset)
    }

    pub fn set_errors(&self, errors: &E) -> Result<Event> {
        Ok(Event::new(&self.kinds().errors, serde_json::to_value(errors)?))
    }

    pub fn clear_errors(&self) -> Event {
        Event::bare(&self.kinds().clear_errors)
    }

    pub fn set_data(&self, data: &T) -> Result<Event> {
        Ok(Event::new(&self.kinds().update, serde_json::to_value(data)?))
    }

    /// Run the loader and commit its result.
    ///
    /// Dispatches `BEGIN_LOADING`, then `SET_DATA` or `SET_ERRORS`, then
    /// `END_LOADING`. Without a loader nothing is dispatched. With
    /// `load_only_once` and an already loaded slice nothing is dispatched
    /// and the stored data is returned. The `loaded` check and the commit
    /// are not atomic: overlapping loads can both run the loader.
    pub async fn load(&self, args: A) -> Option<T> {
        let loader = self.inner.loader.as_ref()?;
        let container = self.inner.rags.container()?;

        if self.inner.load_only_once {
            let state = container.state();
            if self.get_meta(&state).loaded {
                debug!(slice = %self.inner.unique_name, "already loaded, skipping load");
                return self.get_data(&state);
            }
        }

        container.dispatch(self.begin_loading());
        let _finish = FinishLoading {
            container: &*container,
            event: Some(self.end_loading()),
        };

        match loader(args).await {
            Ok(data) => match self.set_data(&data) {
                Ok(event) => {
                    container.dispatch(event);
                    Some(data)
                }
                Err(err) => {
                    self.dispatch_raw_errors(&*container, err.to_string());
                    None
                }
            },
            Err(failure) => {
                debug!(slice = %self.inner.unique_name, "loader failed");
                self.dispatch_errors(&*container, &failure);
                None
            }
        }
    }

    /// Run the updater on the current data and commit its result.
    ///
    /// Never touches `loading`.
    pub async fn update(&self, args: U) {
        let Some(updater) = self.inner.updater.as_ref() else {
            return;
        };
        let Some(container) = self.inner.rags.container() else {
            return;
        };

        let current = self.get_data(&container.state());
        match updater(current, args).await {
            Ok(next) => match self.set_data(&next) {
                Ok(event) => container.dispatch(event),
                Err(err) => self.dispatch_raw_errors(&*container, err.to_string()),
            },
            Err(failure) => {
                debug!(slice = %self.inner.unique_name, "updater failed");
                self.dispatch_errors(&*container, &failure);
            }
        }
    }

    fn dispatch_errors(&self, container: &dyn Container, failure: &E) {
        match self.set_errors(failure) {
            Ok(event) => container.dispatch(event),
            Err(err) => self.dispatch_raw_errors(container, err.to_string()),
        }
    }

    fn dispatch_raw_errors(&self, container: &dyn Container, message: String) {
        warn!(slice = %self.inner.unique_name, error = %message, "committing encoding failure as slice errors");
        container.dispatch(Event::new(&self.kinds().errors, Value::String(message)));
    }

    // --- Accessors ---

    /// The slice's substate and metadata.
    pub fn get(&self, state: &Value) -> SliceState<T, E> {
        self.with_substate(state, |substate| SliceState {
            data: project_data(substate, &self.inner.unique_name),
            meta: project_meta(substate, &self.inner.unique_name),
        })
    }

    pub fn get_data(&self, state: &Value) -> Option<T> {
        self.with_substate(state, |substate| project_data(substate, &self.inner.unique_name))
    }

    pub fn get_meta(&self, state: &Value) -> SliceMeta<E> {
        self.with_substate(state, |substate| project_meta(substate, &self.inner.unique_name))
    }

    pub fn get_is_loading(&self, state: &Value) -> bool {
        self.get_meta(state).loading
    }

    /// A freshly produced initial state.
    pub fn initial_state(&self) -> SliceState<T, E> {
        let value = self.inner.transitions.initial_value();
        SliceState {
            data: project_data(&value, &self.inner.unique_name),
            meta: project_meta(&value, &self.inner.unique_name),
        }
    }

    fn with_substate<R>(&self, state: &Value, f: impl FnOnce(&Value) -> R) -> R {
        match self.inner.placement.locate(state) {
            Some(substate) => f(substate),
            None => {
                if let Placement::Custom(_) = self.inner.placement {
                    warn!(slice = %self.inner.unique_name, "custom locator found no state for slice");
                }
                f(&self.inner.transitions.initial_value())
            }
        }
    }
}

impl<T, A, U, E> Slice<T, A, U, E> {
    /// The slice's transition function.
    pub fn reducer(&self) -> Reducer {
        let transitions = Arc::clone(&self.inner.transitions);
        Arc::new(move |state: Option<&Value>, event: &Event| transitions.apply(state, event))
    }

    /// Caller-given name plus generation; unique within one root.
    pub fn unique_name(&self) -> &str {
        &self.inner.unique_name
    }

    /// Prefix shared by every event kind of this slice.
    pub fn event_prefix(&self) -> &str {
        self.kinds().prefix()
    }

    pub fn owns_event(&self, event: &Event) -> bool {
        event.kind.starts_with(self.event_prefix())
    }

    /// Whether both handles refer to the same slice.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn kinds(&self) -> &EventKinds {
        self.inner.transitions.kinds()
    }
}

fn initial_value<T>(initial_data: Option<InitialData<T>>, slice: String) -> InitialValue
where
    T: Serialize + Send + 'static,
{
    match initial_data {
        Some(produce) => Arc::new(move || encode_initial(Some(produce()), &slice)),
        None => Arc::new(|| Value::Null),
    }
}
