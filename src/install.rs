//! Installer: walks the module tree once, grafting each state fragment into
//! the aggregate tree and registering handlers under fully-qualified names.

use crate::error::{Result, StoreError};
use crate::getters::GetterCell;
use crate::module::{ModuleNode, ModuleTree};
use crate::store::{ActionEntry, ModuleRef, MutationEntry, StoreInner};
use crate::types::{nested_mut, path_display, Path};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use tracing::debug;

#[derive(Default)]
struct Registries {
    mutations: HashMap<String, Vec<MutationEntry>>,
    actions: HashMap<String, Vec<ActionEntry>>,
    getter_cells: HashMap<String, GetterCell>,
    namespace_map: HashMap<String, ModuleRef>,
}

/// Walk the tree and assemble the store internals.
///
/// The aggregate state tree is established here, exactly once; nothing
/// re-derives it later. All definition errors (duplicate getter names,
/// duplicate namespaces, non-object graft targets) surface from this pass,
/// before any handler can run.
pub(crate) fn install(tree: &ModuleTree) -> Result<StoreInner> {
    let mut state = tree.root().state().clone();
    let mut registries = Registries::default();
    let mut path = Path::new();

    install_node(tree, &mut registries, &mut state, &mut path, tree.root())?;

    Ok(StoreInner {
        state: RwLock::new(state),
        version: AtomicU64::new(0),
        mutations: registries.mutations,
        actions: registries.actions,
        getter_cells: registries.getter_cells,
        namespace_map: registries.namespace_map,
    })
}

fn install_node(
    tree: &ModuleTree,
    registries: &mut Registries,
    root_state: &mut Value,
    path: &mut Path,
    node: &ModuleNode,
) -> Result<()> {
    let namespace = tree.namespace_of(path)?;

    if node.namespaced() {
        let previous = registries.namespace_map.insert(
            namespace.clone(),
            ModuleRef {
                namespace: namespace.clone(),
                path: path.clone(),
            },
        );
        if previous.is_some() {
            return Err(StoreError::DuplicateNamespace(namespace));
        }
    }

    if let Some((key, parent_path)) = path.split_last() {
        graft(root_state, parent_path, key, node.state().clone())?;
    }

    debug!(
        path = %path_display(path),
        namespace = %namespace,
        getters = node.getters().len(),
        mutations = node.mutations().len(),
        actions = node.actions().len(),
        "installing module"
    );

    for (name, eval) in node.getters() {
        let qualified = format!("{}{}", namespace, name);
        if registries.getter_cells.contains_key(&qualified) {
            return Err(StoreError::DuplicateGetter(qualified));
        }
        registries.getter_cells.insert(
            qualified,
            GetterCell::new(eval.clone(), namespace.clone(), path.clone()),
        );
    }

    for (name, handler) in node.mutations() {
        registries
            .mutations
            .entry(format!("{}{}", namespace, name))
            .or_default()
            .push(MutationEntry {
                handler: handler.clone(),
                path: path.clone(),
            });
    }

    for (name, handler) in node.actions() {
        registries
            .actions
            .entry(format!("{}{}", namespace, name))
            .or_default()
            .push(ActionEntry {
                handler: handler.clone(),
                namespace: namespace.clone(),
                path: path.clone(),
            });
    }

    for (key, child) in node.children() {
        path.push(key.to_string());
        install_node(tree, registries, root_state, path, child)?;
        path.pop();
    }

    Ok(())
}

/// Graft a child module's initial state onto its parent's slot.
///
/// A child key shadows any same-named field the parent declared in its own
/// state fragment, matching the source-of-truth role of the module tree.
fn graft(root_state: &mut Value, parent_path: &[String], key: &str, fragment: Value) -> Result<()> {
    let parent = nested_mut(root_state, parent_path)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| StoreError::StateNotObject(path_display(parent_path)))?;
    parent.insert(key.to_string(), fragment);
    Ok(())
}
