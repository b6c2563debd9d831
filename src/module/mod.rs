//! Module definitions and the addressable module tree.
//!
//! A store is assembled from one root [`ModuleDecl`] whose nested modules
//! form a strict tree. [`ModuleTree`] makes that tree addressable by path
//! and computes namespace strings from ancestor `namespaced` flags.

mod decl;
mod tree;

pub use decl::ModuleDecl;
pub use tree::{ModuleNode, ModuleTree};
