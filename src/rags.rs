//! Composition root tying the injector, slices and slice maps together.

use crate::error::Result;
use crate::injector::{Composition, PathInjector};
use crate::slice::{Slice, SliceDescriptor};
use crate::slice_map::{SliceMap, SliceMapDescriptor};
use crate::store::Container;
use crate::types::Reducer;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Composition root configuration.
#[derive(Clone, Debug)]
pub struct RagsConfig {
    /// Top-level key under which plain slices register.
    pub namespace: String,

    /// Top-level key under which slice maps register.
    pub map_namespace: String,

    /// Emit a warning when an operation runs before `configure`.
    pub warn_unconfigured: bool,

    /// Warn once when a slice map caches this many keys (None = never).
    pub map_key_warning_threshold: Option<usize>,
}

impl Default for RagsConfig {
    fn default() -> Self {
        Self {
            namespace: "@@rags".to_string(),
            map_namespace: "@@rags/map".to_string(),
            warn_unconfigured: true,
            map_key_warning_threshold: Some(10_000),
        }
    }
}

/// Owns the reducer tree and the generation counter shared by every slice
/// built from it.
///
/// Each root is independent, so tests can build as many as they like.
/// Before [`Rags::configure`] every operation is an inert no-op that only
/// emits a warning.
pub struct Rags {
    config: RagsConfig,
    generation: AtomicU64,
    injector: PathInjector,
}

impl Rags {
    pub fn new(config: RagsConfig) -> Arc<Self> {
        let injector = PathInjector::new(config.warn_unconfigured);
        Arc::new(Self {
            config,
            generation: AtomicU64::new(0),
            injector,
        })
    }

    /// Bind to one container and composition. A later call rebinds.
    pub fn configure(&self, container: Arc<dyn Container>, composition: Composition) {
        self.injector.bind(container, composition);
        info!(namespace = %self.config.namespace, "rags configured");
    }

    pub fn is_configured(&self) -> bool {
        self.injector.is_bound()
    }

    pub fn config(&self) -> &RagsConfig {
        &self.config
    }

    pub fn injector(&self) -> &PathInjector {
        &self.injector
    }

    /// Bound container, or `None` after emitting the setup warning.
    pub fn container(&self) -> Option<Arc<dyn Container>> {
        self.injector.container()
    }

    /// Graft `reducer` into the live tree at `path`.
    pub fn inject_reducer<I, S>(&self, path: I, reducer: Reducer) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path: Vec<String> = path.into_iter().map(Into::into).collect();
        self.injector.inject(&path, reducer)
    }

    /// Build a slice. Without a custom locator it registers itself at
    /// `[namespace, "<name>/<generation>"]`.
    pub fn slice<T, A, U, E>(self: &Arc<Self>, descriptor: SliceDescriptor<T, A, U, E>) -> Slice<T, A, U, E>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        A: Send + 'static,
        U: Send + 'static,
        E: Serialize + DeserializeOwned + Send + 'static,
    {
        Slice::build(self, descriptor)
    }

    /// Build an argument-keyed family of slices.
    pub fn slice_map<T, A, E>(self: &Arc<Self>, descriptor: SliceMapDescriptor<T, A, E>) -> SliceMap<T, A, E>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        A: Serialize + Send + 'static,
        E: Serialize + DeserializeOwned + Send + 'static,
    {
        SliceMap::build(self, descriptor)
    }

    /// Strictly increasing, starting at 1.
    pub(crate) fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}
