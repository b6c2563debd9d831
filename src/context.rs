//! Module-scoped façades over the store.
//!
//! Both types wrap `(store, namespace, path)`: `commit`/`dispatch` prepend
//! the namespace before delegating to the root store (an unnamespaced
//! module's namespace is `""`, so its calls pass through unchanged), and
//! `state()` re-traverses the path against the current aggregate tree on
//! every call rather than caching a branch reference.

use crate::error::Result;
use crate::getters::{self, Getters};
use crate::store::StoreInner;
use crate::types::Path;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// The context handed to action handlers.
#[derive(Clone)]
pub struct ActionContext {
    store: Arc<StoreInner>,
    namespace: String,
    path: Path,
}

impl ActionContext {
    pub(crate) fn new(store: Arc<StoreInner>, namespace: String, path: Path) -> Self {
        Self {
            store,
            namespace,
            path,
        }
    }

    /// The owning module's namespace (`""` for unnamespaced modules).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Commit a mutation, resolving `type_` against this module's namespace.
    pub fn commit(&self, type_: &str, payload: Value) {
        self.store.commit(&self.qualify(type_), payload);
    }

    /// Dispatch an action, resolving `type_` against this module's namespace.
    pub fn dispatch(&self, type_: &str, payload: Value) -> BoxFuture<'static, Result<Value>> {
        Arc::clone(&self.store).dispatch(&self.qualify(type_), payload)
    }

    /// Snapshot of this module's current state fragment.
    pub fn state(&self) -> Value {
        self.store.local_state(&self.path)
    }

    /// Snapshot of the whole aggregate state tree.
    pub fn root_state(&self) -> Value {
        self.store.state_snapshot()
    }

    /// This module's getters, keyed by local name.
    pub fn getters(&self) -> Getters<'_> {
        Getters {
            store: &self.store,
            namespace: &self.namespace,
        }
    }

    /// The store's full getter bag, keyed by fully-qualified name.
    pub fn root_getters(&self) -> Getters<'_> {
        Getters {
            store: &self.store,
            namespace: "",
        }
    }

    /// Evaluate one of this module's getters by local name.
    pub fn getter(&self, name: &str) -> Result<Value> {
        getters::eval(&self.store, &self.qualify(name))
    }

    /// Evaluate any getter by fully-qualified name.
    pub fn root_getter(&self, name: &str) -> Result<Value> {
        getters::eval(&self.store, name)
    }

    fn qualify(&self, name: &str) -> String {
        format!("{}{}", self.namespace, name)
    }
}

/// Handle to an installed namespaced module, resolved through
/// [`crate::Store::module`].
///
/// This is the surface binding helpers build on: it exposes the module's
/// local state and getters plus namespace-resolved `commit`/`dispatch`.
#[derive(Clone)]
pub struct ModuleHandle {
    store: Arc<StoreInner>,
    namespace: String,
    path: Path,
}

impl ModuleHandle {
    pub(crate) fn new(store: Arc<StoreInner>, namespace: String, path: Path) -> Self {
        Self {
            store,
            namespace,
            path,
        }
    }

    /// The module's namespace string.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Commit a mutation by local name.
    pub fn commit(&self, type_: &str, payload: Value) {
        self.store
            .commit(&format!("{}{}", self.namespace, type_), payload);
    }

    /// Dispatch an action by local name.
    pub fn dispatch(&self, type_: &str, payload: Value) -> BoxFuture<'static, Result<Value>> {
        Arc::clone(&self.store).dispatch(&format!("{}{}", self.namespace, type_), payload)
    }

    /// Snapshot of the module's current state fragment.
    pub fn state(&self) -> Value {
        self.store.local_state(&self.path)
    }

    /// Typed projection of the module's current state fragment.
    pub fn state_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.state())
            .map_err(|e| crate::StoreError::Deserialization(e.to_string()))
    }

    /// The module's getters, keyed by local name.
    pub fn getters(&self) -> Getters<'_> {
        Getters {
            store: &self.store,
            namespace: &self.namespace,
        }
    }

    /// Evaluate one of the module's getters by local name.
    pub fn getter(&self, name: &str) -> Result<Value> {
        self.getters().get(name)
    }
}
