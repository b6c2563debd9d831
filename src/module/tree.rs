//! The addressable module tree.

use super::decl::ModuleDecl;
use crate::error::{Result, StoreError};
use crate::types::{path_display, ActionFn, GetterFn, MutationFn};
use serde_json::Value;

/// One node of the module tree, wrapping a consumed [`ModuleDecl`].
///
/// Children are exclusively owned: a node is reachable only by traversal
/// from its parent's `modules`, so the structure is a strict tree.
pub struct ModuleNode {
    state: Value,
    namespaced: bool,
    getters: Vec<(String, GetterFn)>,
    mutations: Vec<(String, MutationFn)>,
    actions: Vec<(String, ActionFn)>,
    children: Vec<(String, ModuleNode)>,
}

impl std::fmt::Debug for ModuleNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleNode").finish_non_exhaustive()
    }
}

impl ModuleNode {
    fn from_decl(decl: ModuleDecl, path: &mut Vec<String>) -> Result<Self> {
        let mut children = Vec::with_capacity(decl.modules.len());
        for (key, child) in decl.modules {
            if key.is_empty() || key.contains('/') {
                return Err(StoreError::InvalidModuleKey(key));
            }
            if children.iter().any(|(k, _)| *k == key) {
                return Err(StoreError::DuplicateModuleKey(format!(
                    "{} under {}",
                    key,
                    path_display(path)
                )));
            }
            path.push(key.clone());
            let node = ModuleNode::from_decl(child, path)?;
            path.pop();
            children.push((key, node));
        }

        Ok(Self {
            state: decl.state,
            namespaced: decl.namespaced,
            getters: decl.getters,
            mutations: decl.mutations,
            actions: decl.actions,
            children,
        })
    }

    /// Whether this module isolates its handler names under its key.
    pub fn namespaced(&self) -> bool {
        self.namespaced
    }

    /// The module's initial state fragment.
    pub fn state(&self) -> &Value {
        &self.state
    }

    pub(crate) fn getters(&self) -> &[(String, GetterFn)] {
        &self.getters
    }

    pub(crate) fn mutations(&self) -> &[(String, MutationFn)] {
        &self.mutations
    }

    pub(crate) fn actions(&self) -> &[(String, ActionFn)] {
        &self.actions
    }

    pub(crate) fn children(&self) -> impl Iterator<Item = (&str, &ModuleNode)> {
        self.children.iter().map(|(k, n)| (k.as_str(), n))
    }

    fn child(&self, key: &str) -> Option<&ModuleNode> {
        self.children
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, n)| n)
    }
}

/// Addressable tree of modules built once from a root definition.
pub struct ModuleTree {
    root: ModuleNode,
}

impl std::fmt::Debug for ModuleTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleTree").finish_non_exhaustive()
    }
}

impl ModuleTree {
    /// Build the tree, consuming the root definition.
    ///
    /// Fails if any module key is empty, contains `/`, or collides with a
    /// sibling key.
    pub fn build(root: ModuleDecl) -> Result<Self> {
        let root = ModuleNode::from_decl(root, &mut Vec::new())?;
        Ok(Self { root })
    }

    /// The root node (path = empty).
    pub fn root(&self) -> &ModuleNode {
        &self.root
    }

    /// Resolve the node at `path`.
    ///
    /// Paths produced by the tree itself always resolve; externally supplied
    /// paths fail with [`StoreError::ModuleNotFound`] on a missing segment.
    pub fn get(&self, path: &[String]) -> Result<&ModuleNode> {
        let mut node = &self.root;
        for (depth, key) in path.iter().enumerate() {
            node = node
                .child(key)
                .ok_or_else(|| StoreError::ModuleNotFound(path[..=depth].join("/")))?;
        }
        Ok(node)
    }

    /// Compute the namespace string for the node at `path`.
    ///
    /// Walks root to leaf; every ancestor (the node itself included) whose
    /// `namespaced` flag is set contributes `key + "/"`. The root contributes
    /// nothing, so the root namespace is always `""`.
    pub fn namespace_of(&self, path: &[String]) -> Result<String> {
        let mut node = &self.root;
        let mut namespace = String::new();
        for (depth, key) in path.iter().enumerate() {
            node = node
                .child(key)
                .ok_or_else(|| StoreError::ModuleNotFound(path[..=depth].join("/")))?;
            if node.namespaced {
                namespace.push_str(key);
                namespace.push('/');
            }
        }
        Ok(namespace)
    }
}
