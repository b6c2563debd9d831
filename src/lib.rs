//! # statetree
//!
//! A modular, namespaced, reactive application-state container: one mutable
//! state tree assembled from independently authored modules, each
//! contributing a state fragment, derived getters, synchronous mutations,
//! and asynchronous actions.
//!
//! ## Core Concepts
//!
//! - **Modules**: Self-contained units of state + handlers, nested into a tree
//! - **Namespaces**: `namespaced` modules isolate their handler names under
//!   `key/` prefixes computed from ancestor flags
//! - **Mutations**: The only sanctioned state writers, run synchronously via
//!   `commit` in registration order
//! - **Actions**: Async handlers dispatched by type; all matched handlers run
//!   to completion and their results aggregate in registration order
//! - **Getters**: Derived values cached until the next commit
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use statetree::{ModuleDecl, Store};
//!
//! let cart = ModuleDecl::new()
//!     .namespaced(true)
//!     .state(json!({"items": []}))
//!     .mutation("addItem", |state, item| {
//!         if let Some(items) = state["items"].as_array_mut() {
//!             items.push(item);
//!         }
//!     })
//!     .getter("count", |state, _getters, _root, _root_getters| {
//!         Ok(json!(state["items"].as_array().map_or(0, |a| a.len())))
//!     });
//!
//! let store = Store::new(ModuleDecl::new().module("cart", cart))?;
//!
//! store.commit("cart/addItem", json!({"id": 1}));
//! assert_eq!(store.getter("cart/count")?, json!(1));
//! # Ok::<(), statetree::StoreError>(())
//! ```

pub mod context;
pub mod error;
pub mod getters;
mod install;
pub mod module;
pub mod store;
pub mod types;

// Re-exports
pub use context::{ActionContext, ModuleHandle};
pub use error::{Result, StoreError};
pub use getters::Getters;
pub use module::{ModuleDecl, ModuleNode, ModuleTree};
pub use store::Store;
pub use types::{ActionFn, GetterFn, MutationFn, Path};
