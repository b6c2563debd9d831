//! Main Store struct tying all components together.

use crate::context::{ActionContext, ModuleHandle};
use crate::error::Result;
use crate::getters::{self, GetterCell, Getters};
use crate::install;
use crate::module::{ModuleDecl, ModuleTree};
use crate::types::{nested_mut, path_display, ActionFn, MutationFn, Path};
use futures::future::{self, join_all, BoxFuture, FutureExt};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// One registered mutation handler, bound to its owning module's path.
pub(crate) struct MutationEntry {
    pub(crate) handler: MutationFn,
    pub(crate) path: Path,
}

/// One registered action handler, bound to its owning module's context data.
pub(crate) struct ActionEntry {
    pub(crate) handler: ActionFn,
    pub(crate) namespace: String,
    pub(crate) path: Path,
}

/// Installed context data for a namespaced module.
pub(crate) struct ModuleRef {
    pub(crate) namespace: String,
    pub(crate) path: Path,
}

/// Store internals shared by contexts and dispatch futures.
pub(crate) struct StoreInner {
    /// The aggregate state tree. Writes happen only through `commit`.
    pub(crate) state: RwLock<Value>,

    /// Bumped by every effective commit; getter cells compare against it.
    pub(crate) version: AtomicU64,

    /// Mutation type -> ordered handler list. Multiple entries under one key
    /// are intentional (typically unnamespaced modules sharing a type).
    pub(crate) mutations: HashMap<String, Vec<MutationEntry>>,

    /// Action type -> ordered handler list.
    pub(crate) actions: HashMap<String, Vec<ActionEntry>>,

    /// Fully-qualified getter name -> cached computation cell.
    pub(crate) getter_cells: HashMap<String, GetterCell>,

    /// Namespace string -> installed module context data.
    pub(crate) namespace_map: HashMap<String, ModuleRef>,
}

impl std::fmt::Debug for StoreInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreInner").finish_non_exhaustive()
    }
}

impl StoreInner {
    pub(crate) fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub(crate) fn state_snapshot(&self) -> Value {
        self.state.read().clone()
    }

    /// Snapshot of the state fragment at `path`, re-traversed from the
    /// current aggregate tree on every call.
    pub(crate) fn local_state(&self, path: &[String]) -> Value {
        let state = self.state.read();
        match crate::types::nested(&state, path) {
            Some(local) => local.clone(),
            None => {
                warn!(path = %path_display(path), "module state unresolvable");
                Value::Null
            }
        }
    }

    pub(crate) fn commit(&self, type_: &str, payload: Value) {
        if type_.is_empty() {
            warn!("commit called without a mutation type");
            return;
        }
        let entries = match self.mutations.get(type_) {
            Some(entries) if !entries.is_empty() => entries,
            _ => {
                warn!(mutation = type_, "no handler registered for mutation");
                return;
            }
        };

        debug!(mutation = type_, handlers = entries.len(), "commit");
        {
            let mut state = self.state.write();
            for entry in entries {
                match nested_mut(&mut state, &entry.path) {
                    Some(local) => (entry.handler)(local, payload.clone()),
                    None => warn!(
                        mutation = type_,
                        path = %path_display(&entry.path),
                        "module state unresolvable, skipping handler"
                    ),
                }
            }
        }
        self.version.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn dispatch(
        self: Arc<Self>,
        type_: &str,
        payload: Value,
    ) -> BoxFuture<'static, Result<Value>> {
        if type_.is_empty() {
            warn!("dispatch called without an action type");
            return future::ready(Ok(Value::Null)).boxed();
        }
        let entries = match self.actions.get(type_) {
            Some(entries) if !entries.is_empty() => entries,
            _ => {
                warn!(action = type_, "no handler registered for action");
                return future::ready(Ok(Value::Null)).boxed();
            }
        };

        debug!(action = type_, handlers = entries.len(), "dispatch");
        let handlers: Vec<BoxFuture<'static, Result<Value>>> = entries
            .iter()
            .map(|entry| {
                let context = ActionContext::new(
                    Arc::clone(&self),
                    entry.namespace.clone(),
                    entry.path.clone(),
                );
                (entry.handler)(context, payload.clone())
            })
            .collect();

        async move {
            // Every handler runs to completion before the aggregate settles;
            // a failure surfaces afterwards, first in registration order.
            let results = join_all(handlers).await;
            let mut values = Vec::with_capacity(results.len());
            for result in results {
                values.push(result?);
            }
            Ok(match values.len() {
                1 => values.pop().unwrap_or(Value::Null),
                _ => Value::Array(values),
            })
        }
        .boxed()
    }
}

/// The public store: one aggregate state tree assembled from a module tree,
/// with namespaced handler registries and cached derived getters.
///
/// Constructed once from a root [`ModuleDecl`]; modules cannot be added or
/// removed afterwards.
pub struct Store {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Build a store from a root module definition.
    ///
    /// The module tree is built and installed synchronously; any definition
    /// error (invalid or duplicate module keys, duplicate qualified getter
    /// names, duplicate namespaces, non-object graft targets) fails here,
    /// before any handler can run.
    pub fn new(root: ModuleDecl) -> Result<Self> {
        let tree = ModuleTree::build(root)?;
        let inner = install::install(&tree)?;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Read-only snapshot of the aggregate state tree.
    ///
    /// Mutating the returned value does not affect the store; the only
    /// sanctioned writer is a mutation handler invoked through [`commit`].
    ///
    /// [`commit`]: Store::commit
    pub fn state(&self) -> Value {
        self.inner.state_snapshot()
    }

    /// Typed projection of the aggregate state tree.
    pub fn state_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.state())
            .map_err(|e| crate::StoreError::Deserialization(e.to_string()))
    }

    /// The flat, namespaced getter bag (keys like `"cart/count"`).
    pub fn getters(&self) -> Getters<'_> {
        Getters {
            store: &self.inner,
            namespace: "",
        }
    }

    /// Evaluate a getter by fully-qualified name.
    pub fn getter(&self, name: &str) -> Result<Value> {
        getters::eval(&self.inner, name)
    }

    /// Invoke every mutation handler registered under `type_`, in
    /// registration order, fully synchronously.
    ///
    /// An empty or unregistered type is a reported no-op.
    pub fn commit(&self, type_: &str, payload: Value) {
        self.inner.commit(type_, payload);
    }

    /// Invoke every action handler registered under `type_` and wait for all
    /// of them.
    ///
    /// Exactly one handler resolves to that handler's value; several resolve
    /// to an array in registration order, regardless of completion timing.
    /// If any handler fails, the first failure in registration order is
    /// returned once every handler has settled; the rest of the outcomes are
    /// discarded. An empty or unregistered type resolves to `Value::Null`.
    pub async fn dispatch(&self, type_: &str, payload: Value) -> Result<Value> {
        Arc::clone(&self.inner).dispatch(type_, payload).await
    }

    /// Resolve an installed namespaced module by its namespace string
    /// (e.g. `"cart/"`).
    ///
    /// Unknown namespaces yield `None` so binding adapters can no-op.
    pub fn module(&self, namespace: &str) -> Option<ModuleHandle> {
        self.inner.namespace_map.get(namespace).map(|module| {
            ModuleHandle::new(
                Arc::clone(&self.inner),
                module.namespace.clone(),
                module.path.clone(),
            )
        })
    }

    /// Registered namespaces, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = self.inner.namespace_map.keys().cloned().collect();
        namespaces.sort();
        namespaces
    }
}
