//! Slice map descriptors.

use crate::slice::{InitialData, Loader};
use futures::future::{self, FutureExt};
use std::future::Future;
use std::sync::Arc;

/// Immutable configuration from which a [`crate::SliceMap`] is built.
///
/// Every materialized key gets its own slice sharing this loader and
/// initial data.
pub struct SliceMapDescriptor<T, A, E = String> {
    pub(crate) name: String,
    pub(crate) loader: Option<Loader<T, A, E>>,
    pub(crate) initial_data: Option<InitialData<T>>,
    pub(crate) load_only_once: bool,
}

impl<T, A, E> SliceMapDescriptor<T, A, E>
where
    T: Send + 'static,
    A: 'static,
    E: Send + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            loader: None,
            initial_data: None,
            load_only_once: false,
        }
    }

    /// Asynchronous loader, called with the arguments that key the slice.
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

    pub fn initial_data<F>(mut self, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.initial_data = Some(Arc::new(f));
        self
    }

    /// Skip `load` for a key once its slice reports `loaded`.
    pub fn load_only_once(mut self, enabled: bool) -> Self {
        self.load_only_once = enabled;
        self
    }
}
