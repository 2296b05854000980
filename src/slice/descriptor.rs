//! Slice descriptors.

use crate::types::{Event, PartialReducer, PartialState, SliceState};
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Produces a slice's data from load arguments.
pub type Loader<T, A, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Produces replacement data from the current data and update arguments.
pub type Updater<T, U, E> =
    Arc<dyn Fn(Option<T>, U) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Maps the full composed state to one slice's substate.
pub type Locator = Arc<dyn Fn(&Value) -> Option<&Value> + Send + Sync>;

/// Produces the data of a fresh slice.
pub type InitialData<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Where a slice's substate lives in the composed state.
#[derive(Clone)]
pub enum Placement {
    /// Nested object fields, outermost first.
    Path(Vec<String>),
    /// Caller-supplied lookup.
    Custom(Locator),
}

impl Placement {
    pub(crate) fn locate<'a>(&self, state: &'a Value) -> Option<&'a Value> {
        match self {
            Placement::Path(path) => path
                .iter()
                .try_fold(state, |node, segment| node.get(segment.as_str())),
            Placement::Custom(locator) => locator(state),
        }
    }
}

/// Immutable configuration from which a [`crate::Slice`] is built.
///
/// - `T`: data type
/// - `A`: load arguments
/// - `U`: update arguments
/// - `E`: failure payload of the loader and updater
///
/// Without a locator the slice registers itself under the root's namespace
/// at construction time. With [`SliceDescriptor::locator`] or
/// [`SliceDescriptor::locate_at`] the caller owns placement and nothing is
/// registered.
pub struct SliceDescriptor<T, A = (), U = (), E = String> {
    pub(crate) name: String,
    pub(crate) loader: Option<Loader<T, A, E>>,
    pub(crate) updater: Option<Updater<T, U, E>>,
    pub(crate) partial_reducer: Option<Arc<dyn PartialReducer>>,
    pub(crate) placement: Option<Placement>,
    pub(crate) initial_data: Option<InitialData<T>>,
    pub(crate) load_only_once: bool,
}

impl<T, A, U, E> SliceDescriptor<T, A, U, E>
where
    T: Send + 'static,
    A: 'static,
    U: 'static,
    E: Send + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            loader: None,
            updater: None,
            partial_reducer: None,
            placement: None,
            initial_data: None,
            load_only_once: false,
        }
    }

    /// Asynchronous loader.
    pub fn loader<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let loader: Loader<T, A, E> = Arc::new(move |args: A| f(args).boxed());
        self.loader = Some(loader);
        self
    }

    /// Loader whose result is available immediately.
    pub fn loader_fn<F>(self, f: F) -> Self
    where
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        self.loader(move |args| future::ready(f(args)))
    }

    /// Asynchronous updater. Its result replaces the data wholesale.
    pub fn updater<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Option<T>, U) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let updater: Updater<T, U, E> =
            Arc::new(move |current: Option<T>, args: U| f(current, args).boxed());
        self.updater = Some(updater);
        self
    }

    /// Updater whose result is available immediately.
    pub fn updater_fn<F>(self, f: F) -> Self
    where
        F: Fn(Option<T>, U) -> Result<T, E> + Send + Sync + 'static,
    {
        self.updater(move |current, args| future::ready(f(current, args)))
    }

    /// Handler for events the slice does not own.
    pub fn partial_reducer<F>(mut self, f: F) -> Self
    where
        F: Fn(&SliceState, &Event) -> Option<PartialState> + Send + Sync + 'static,
    {
        let handler: Arc<dyn PartialReducer> = Arc::new(f);
        self.partial_reducer = Some(handler);
        self
    }

    /// Same as [`SliceDescriptor::partial_reducer`] for a shared handler.
    pub fn partial_reducer_handler(mut self, handler: Arc<dyn PartialReducer>) -> Self {
        self.partial_reducer = Some(handler);
        self
    }

    /// Custom lookup of the slice's substate. Disables registration.
    pub fn locator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Option<&Value> + Send + Sync + 'static,
    {
        let locator: Locator = Arc::new(f);
        self.placement = Some(Placement::Custom(locator));
        self
    }

    /// Substate at a fixed path. Disables registration.
    pub fn locate_at<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.placement = Some(Placement::Path(path.into_iter().map(Into::into).collect()));
        self
    }

    pub fn initial_data<F>(mut self, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.initial_data = Some(Arc::new(f));
        self
    }

    /// Skip `load` once the slice reports `loaded`.
    pub fn load_only_once(mut self, enabled: bool) -> Self {
        self.load_only_once = enabled;
        self
    }
}
