//! Module definition builder.

use crate::context::ActionContext;
use crate::error::Result;
use crate::getters::Getters;
use crate::types::{ActionFn, GetterFn, MutationFn};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

/// Definition of a single module: a state fragment plus its getters,
/// mutations, actions, and nested child modules.
///
/// Declaration order is registration order: when two modules register a
/// handler under the same fully-qualified type, `commit`/`dispatch` run the
/// handlers in the order the modules declared them (parents before children,
/// siblings in declaration order).
///
/// ```
/// use serde_json::json;
/// use statetree::ModuleDecl;
///
/// let cart = ModuleDecl::new()
///     .namespaced(true)
///     .state(json!({"items": []}))
///     .mutation("addItem", |state, item| {
///         if let Some(items) = state["items"].as_array_mut() {
///             items.push(item);
///         }
///     })
///     .getter("count", |state, _getters, _root, _root_getters| {
///         Ok(json!(state["items"].as_array().map_or(0, |a| a.len())))
///     });
///
/// let root = ModuleDecl::new().module("cart", cart);
/// ```
pub struct ModuleDecl {
    pub(crate) state: Value,
    pub(crate) namespaced: bool,
    pub(crate) getters: Vec<(String, GetterFn)>,
    pub(crate) mutations: Vec<(String, MutationFn)>,
    pub(crate) actions: Vec<(String, ActionFn)>,
    pub(crate) modules: Vec<(String, ModuleDecl)>,
}

impl ModuleDecl {
    /// Create an empty module definition (empty object state, not namespaced).
    pub fn new() -> Self {
        Self {
            state: Value::Object(Map::new()),
            namespaced: false,
            getters: Vec::new(),
            mutations: Vec::new(),
            actions: Vec::new(),
            modules: Vec::new(),
        }
    }

    /// Set the module's initial state fragment.
    pub fn state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    /// Set whether this module's handler names are isolated under its key.
    pub fn namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = namespaced;
        self
    }

    /// Register a derived value evaluated from
    /// `(local state, local getters, root state, root getters)`.
    pub fn getter<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a Value, Getters<'a>, &'a Value, Getters<'a>) -> Result<Value>
            + Send
            + Sync
            + 'static,
    {
        self.getters.push((name.into(), Arc::new(f)));
        self
    }

    /// Register a synchronous state-mutating handler.
    pub fn mutation<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Value, Value) + Send + Sync + 'static,
    {
        self.mutations.push((name.into(), Arc::new(f)));
        self
    }

    /// Register an asynchronous side-effecting handler.
    ///
    /// Whatever future the handler returns is boxed unconditionally, so a
    /// handler that completes synchronously still yields through the same
    /// normalized path as one that suspends.
    pub fn action<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ActionContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let handler: ActionFn = Arc::new(move |ctx, payload| f(ctx, payload).boxed());
        self.actions.push((name.into(), handler));
        self
    }

    /// Attach a nested child module under `key`.
    pub fn module(mut self, key: impl Into<String>, child: ModuleDecl) -> Self {
        self.modules.push((key.into(), child));
        self
    }
}

impl Default for ModuleDecl {
    fn default() -> Self {
        Self::new()
    }
}
