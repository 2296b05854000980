//! Argument-keyed family of slices.

use super::descriptor::SliceMapDescriptor;
use super::key::args_key;
use crate::rags::Rags;
use crate::slice::{encode_initial, project_data, project_meta, InitialData, Loader, Slice, SliceDescriptor};
use crate::types::{Event, SliceMeta, SliceState};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

struct SliceMapInner<T, A, E> {
    rags: Arc<Rags>,
    unique_name: String,
    loader: Option<Loader<T, A, E>>,
    initial_data: Option<InitialData<T>>,
    load_only_once: bool,
    cache: Mutex<HashMap<String, Slice<T, A, (), E>>>,
    threshold_warned: AtomicBool,
}

/// One descriptor-shaped API over a lazily materialized slice per distinct
/// argument value.
///
/// Each key's slice lives at `[map_namespace, "<name>/<generation>", key]`.
/// The cache never evicts; see [`crate::RagsConfig::map_key_warning_threshold`].
pub struct SliceMap<T, A, E = String> {
    inner: Arc<SliceMapInner<T, A, E>>,
}

impl<T, A, E> Clone for SliceMap<T, A, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, A, E> SliceMap<T, A, E>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    A: Serialize + Send + 'static,
    E: Serialize + DeserializeOwned + Send + 'static,
{
    pub(crate) fn build(rags: &Arc<Rags>, descriptor: SliceMapDescriptor<T, A, E>) -> Self {
        let SliceMapDescriptor {
            name,
            loader,
            initial_data,
            load_only_once,
        } = descriptor;

        let unique_name = format!("{}/{}", name, rags.next_generation());
        Self {
            inner: Arc::new(SliceMapInner {
                rags: Arc::clone(rags),
                unique_name,
                loader,
                initial_data,
                load_only_once,
                cache: Mutex::new(HashMap::new()),
                threshold_warned: AtomicBool::new(false),
            }),
        }
    }

    /// The slice for `args`, materializing and registering it on first use.
    ///
    /// Returns `None` before the root is configured (nothing is cached, so
    /// the key materializes normally afterwards) or when `args` cannot be
    /// encoded as a key.
    pub fn slice(&self, args: &A) -> Option<Slice<T, A, (), E>> {
        let key = self.key(args)?;

        let mut cache = self.inner.cache.lock();
        if let Some(slice) = cache.get(&key) {
            return Some(slice.clone());
        }

        let rags = &self.inner.rags;
        if !rags.is_configured() {
            rags.injector().warn_unconfigured();
            return None;
        }

        let path = vec![
            rags.config().map_namespace.clone(),
            self.inner.unique_name.clone(),
            key.clone(),
        ];
        let mut descriptor = SliceDescriptor::<T, A, (), E>::new(self.inner.unique_name.clone())
            .load_only_once(self.inner.load_only_once)
            .locate_at(path.clone());
        descriptor.loader = self.inner.loader.clone();
        descriptor.initial_data = self.inner.initial_data.clone();

        let slice = rags.slice(descriptor);
        if let Err(err) = rags.injector().inject(&path, slice.reducer()) {
            error!(map = %self.inner.unique_name, key = %key, error = %err, "failed to register keyed slice");
            return None;
        }

        debug!(map = %self.inner.unique_name, key = %key, "materialized keyed slice");
        cache.insert(key, slice.clone());
        self.check_threshold(cache.len());
        Some(slice)
    }

    // --- Actions ---

    /// Load the slice for `args`, passing `args` to the loader.
    pub async fn load(&self, args: A) -> Option<T> {
        let slice = self.slice(&args)?;
        slice.load(args).await
    }

    pub fn reset(&self, args: &A) {
        self.dispatch_with(args, |slice| slice.reset());
    }

    pub fn clear_errors(&self, args: &A) {
        self.dispatch_with(args, |slice| slice.clear_errors());
    }

    fn dispatch_with(&self, args: &A, event: impl FnOnce(&Slice<T, A, (), E>) -> Event) {
        let Some(slice) = self.slice(args) else {
            return;
        };
        if let Some(container) = self.inner.rags.container() {
            container.dispatch(event(&slice));
        }
    }

    // --- Accessors ---

    /// The substate holding every materialized key of this map.
    pub fn get<'a>(&self, state: &'a Value) -> Option<&'a Value> {
        state
            .get(self.inner.rags.config().map_namespace.as_str())
            .and_then(|family| family.get(self.inner.unique_name.as_str()))
    }

    /// State of the slice for `args`; the initial state if the key was never
    /// materialized.
    pub fn get_with_args(&self, state: &Value, args: &A) -> SliceState<T, E> {
        match self.cached(args) {
            Some(slice) => slice.get(state),
            None => self.initial_state(),
        }
    }

    pub fn get_data(&self, state: &Value, args: &A) -> Option<T> {
        match self.cached(args) {
            Some(slice) => slice.get_data(state),
            None => self.initial_state().data,
        }
    }

    pub fn get_meta(&self, state: &Value, args: &A) -> SliceMeta<E> {
        match self.cached(args) {
            Some(slice) => slice.get_meta(state),
            None => self.initial_state().meta,
        }
    }

    pub fn get_is_loading(&self, state: &Value, args: &A) -> bool {
        self.get_meta(state, args).loading
    }

    /// What a freshly materialized key reports.
    pub fn initial_state(&self) -> SliceState<T, E> {
        let name = self.inner.unique_name.as_str();
        let data = encode_initial(self.inner.initial_data.as_ref().map(|produce| produce()), name);
        let fresh = SliceState::<Value, Value>::initial((!data.is_null()).then_some(data)).into_value();
        SliceState {
            data: project_data(&fresh, name),
            meta: project_meta(&fresh, name),
        }
    }

    /// Number of materialized keys.
    pub fn len(&self) -> usize {
        self.inner.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unique_name(&self) -> &str {
        &self.inner.unique_name
    }

    fn key(&self, args: &A) -> Option<String> {
        args_key(args)
            .map_err(|err| warn!(map = %self.inner.unique_name, error = %err, "arguments cannot be encoded as a key"))
            .ok()
    }

    fn cached(&self, args: &A) -> Option<Slice<T, A, (), E>> {
        let key = self.key(args)?;
        self.inner.cache.lock().get(&key).cloned()
    }

    fn check_threshold(&self, len: usize) {
        let Some(threshold) = self.inner.rags.config().map_key_warning_threshold else {
            return;
        };
        if len >= threshold && !self.inner.threshold_warned.swap(true, Ordering::Relaxed) {
            warn!(
                map = %self.inner.unique_name,
                keys = len,
                "slice map cache reached its warning threshold; keys are never evicted"
            );
        }
    }
}
