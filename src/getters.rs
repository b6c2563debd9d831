//! Reactive getter layer: cached computation cells over registered getters.
//!
//! Invalidation is coarse: the store stamps every effective commit with a new
//! version, and a cell recomputes on the first read whose cached version is
//! stale. Repeated reads between commits return the cached value without
//! re-invoking the evaluator.

use crate::error::{Result, StoreError};
use crate::store::StoreInner;
use crate::types::{nested, path_display, GetterFn, Path};
use parking_lot::Mutex;
use serde_json::Value;
use std::cell::RefCell;

/// A cached computation cell for one registered getter.
pub(crate) struct GetterCell {
    eval: GetterFn,
    namespace: String,
    path: Path,
    cache: Mutex<Option<(u64, Value)>>,
}

impl GetterCell {
    pub(crate) fn new(eval: GetterFn, namespace: String, path: Path) -> Self {
        Self {
            eval,
            namespace,
            path,
            cache: Mutex::new(None),
        }
    }
}

thread_local! {
    /// Names of getters currently being evaluated on this thread, used to
    /// turn self-referential getters into an error instead of unbounded
    /// recursion.
    static EVAL_STACK: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Evaluate a fully-qualified getter through its cache cell.
pub(crate) fn eval(store: &StoreInner, name: &str) -> Result<Value> {
    let cell = store
        .getter_cells
        .get(name)
        .ok_or_else(|| StoreError::UnknownGetter(name.to_string()))?;

    if EVAL_STACK.with(|stack| stack.borrow().iter().any(|n| n == name)) {
        return Err(StoreError::GetterCycle(name.to_string()));
    }

    let version = store.version();
    if let Some((cached_version, value)) = cell.cache.lock().clone() {
        if cached_version == version {
            return Ok(value);
        }
    }

    EVAL_STACK.with(|stack| stack.borrow_mut().push(name.to_string()));
    let result = recompute(store, cell);
    EVAL_STACK.with(|stack| {
        stack.borrow_mut().pop();
    });

    let value = result?;
    *cell.cache.lock() = Some((version, value.clone()));
    Ok(value)
}

fn recompute(store: &StoreInner, cell: &GetterCell) -> Result<Value> {
    let snapshot = store.state_snapshot();
    let local = nested(&snapshot, &cell.path)
        .ok_or_else(|| StoreError::StatePath(path_display(&cell.path)))?;

    let local_getters = Getters {
        store,
        namespace: &cell.namespace,
    };
    let root_getters = Getters {
        store,
        namespace: "",
    };

    (cell.eval)(local, local_getters, &snapshot, root_getters)
}

/// A read-only view over the store's flat getter bag.
///
/// The root view exposes every fully-qualified name; a namespaced view
/// exposes only the owning module's entries, re-keyed with the namespace
/// prefix stripped.
#[derive(Clone, Copy)]
pub struct Getters<'a> {
    pub(crate) store: &'a StoreInner,
    pub(crate) namespace: &'a str,
}

impl<'a> Getters<'a> {
    /// Evaluate the getter registered under `name` (local to this view's
    /// namespace), recomputing only if state changed since the last read.
    pub fn get(&self, name: &str) -> Result<Value> {
        eval(self.store, &format!("{}{}", self.namespace, name))
    }

    /// Whether `name` is registered in this view.
    pub fn contains(&self, name: &str) -> bool {
        self.store
            .getter_cells
            .contains_key(&format!("{}{}", self.namespace, name))
    }

    /// Names visible through this view, prefix-stripped and sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .store
            .getter_cells
            .keys()
            .filter_map(|key| key.strip_prefix(self.namespace))
            .map(|name| name.to_string())
            .collect();
        names.sort();
        names
    }
}
