//! Injector keeping a container's root reducer in sync with the tree.

use super::combine::Composition;
use super::tree::ReducerTree;
use crate::error::{RagsError, Result};
use crate::store::Container;
use crate::types::Reducer;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, warn};

/// Container plus composition the injector installs into.
#[derive(Clone)]
struct Binding {
    container: Arc<dyn Container>,
    composition: Composition,
}

/// Owns the reducer tree of one composition root.
///
/// Until [`PathInjector::bind`] is called every injection is an inert no-op
/// that only emits a warning.
pub struct PathInjector {
    tree: Mutex<ReducerTree>,
    binding: RwLock<Option<Binding>>,
    warn_unconfigured: bool,
}

impl PathInjector {
    pub fn new(warn_unconfigured: bool) -> Self {
        Self {
            tree: Mutex::new(ReducerTree::new()),
            binding: RwLock::new(None),
            warn_unconfigured,
        }
    }

    /// Bind to a container. A later call rebinds.
    ///
    /// Reducers injected while unbound are composed and installed here.
    pub fn bind(&self, container: Arc<dyn Container>, composition: Composition) {
        let tree = self.tree.lock();
        let mut binding = self.binding.write();
        if binding.is_some() {
            debug!("rebinding injector to a new container");
        }
        if !tree.is_empty() || !composition.static_reducers.is_empty() {
            container.replace_reducer(tree.compose(&composition));
            debug!(leaves = tree.leaf_count(), "installed pending reducers");
        }
        *binding = Some(Binding {
            container,
            composition,
        });
    }

    pub fn is_bound(&self) -> bool {
        self.binding.read().is_some()
    }

    /// Bound container, or `None` after emitting the setup warning.
    pub fn container(&self) -> Option<Arc<dyn Container>> {
        let container = self.binding.read().as_ref().map(|b| Arc::clone(&b.container));
        if container.is_none() {
            self.warn_unconfigured();
        }
        container
    }

    /// Graft `reducer` at `path` and reinstall the composed root.
    ///
    /// The root is rebuilt from the entire tree and swapped while the tree
    /// lock is held, so concurrent injections install in mutation order.
    /// While unbound the reducer is only kept in the tree until `bind`.
    pub fn inject(&self, path: &[String], reducer: Reducer) -> Result<()> {
        if path.is_empty() {
            return Err(RagsError::EmptyPath);
        }

        let mut tree = self.tree.lock();
        tree.insert(path, reducer)?;

        let Some(binding) = self.binding.read().clone() else {
            self.warn_unconfigured();
            return Ok(());
        };
        let root = tree.compose(&binding.composition);
        binding.container.replace_reducer(root);

        debug!(path = %path.join("."), leaves = tree.leaf_count(), "injected reducer");
        Ok(())
    }

    /// Whether a reducer has been injected at `path`.
    pub fn contains(&self, path: &[String]) -> bool {
        self.tree.lock().contains(path)
    }

    pub fn leaf_count(&self) -> usize {
        self.tree.lock().leaf_count()
    }

    pub(crate) fn warn_unconfigured(&self) {
        if self.warn_unconfigured {
            warn!("rags is not configured: call Rags::configure(container, composition) before using slices");
        }
    }
}
