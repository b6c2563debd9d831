//! Core types shared across the container.

use crate::context::ActionContext;
use crate::error::Result;
use crate::getters::Getters;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

/// Position of a module in the tree: ordered child keys from the root.
/// The root module's path is empty.
pub type Path = Vec<String>;

/// Getter evaluator: `(local state, local getters, root state, root getters)`.
pub type GetterFn = Arc<
    dyn for<'a> Fn(&'a Value, Getters<'a>, &'a Value, Getters<'a>) -> Result<Value> + Send + Sync,
>;

/// Mutation handler: `(local state, payload)`. The only sanctioned writer of
/// the aggregate state tree, invoked via [`crate::Store::commit`].
pub type MutationFn = Arc<dyn Fn(&mut Value, Value) + Send + Sync>;

/// Action handler: `(context, payload)`, already normalized to a boxed future.
pub type ActionFn =
    Arc<dyn Fn(ActionContext, Value) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Resolve a nested branch of the aggregate state tree by path.
pub(crate) fn nested<'a>(state: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter()
        .try_fold(state, |state, key| state.as_object()?.get(key))
}

/// Mutable variant of [`nested`].
pub(crate) fn nested_mut<'a>(state: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    path.iter()
        .try_fold(state, |state, key| state.as_object_mut()?.get_mut(key))
}

/// Render a path for diagnostics (root renders as `<root>`).
pub(crate) fn path_display(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join("/")
    }
}
