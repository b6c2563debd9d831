//! Integration tests for the state container.

use futures::executor::block_on;
use serde::Deserialize;
use serde_json::{json, Value};
use statetree::{ModuleDecl, Store};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn cart_module() -> ModuleDecl {
    ModuleDecl::new()
        .namespaced(true)
        .state(json!({"items": []}))
        .mutation("addItem", |state, item| {
            if let Some(items) = state["items"].as_array_mut() {
                items.push(item);
            }
        })
        .getter("count", |state, _getters, _root, _root_getters| {
            Ok(json!(state["items"].as_array().map_or(0, |a| a.len())))
        })
}

/// Completes on the n-th poll, so earlier-registered handlers can be forced
/// to finish after later ones.
struct SettleAfter {
    polls_left: usize,
}

impl SettleAfter {
    fn new(polls: usize) -> Self {
        Self { polls_left: polls }
    }
}

impl Future for SettleAfter {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.polls_left == 0 {
            Poll::Ready(())
        } else {
            self.polls_left -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

// --- Realistic Workflow Tests ---

#[test]
fn test_cart_workflow() {
    init_tracing();
    let store = Store::new(ModuleDecl::new().module("cart", cart_module())).unwrap();

    store.commit("cart/addItem", json!({"id": 1}));
    assert_eq!(store.getter("cart/count").unwrap(), json!(1));

    store.commit("cart/addItem", json!({"id": 2}));
    assert_eq!(store.getter("cart/count").unwrap(), json!(2));
    assert_eq!(
        store.state()["cart"]["items"],
        json!([{"id": 1}, {"id": 2}])
    );
}

#[test]
fn test_unnamespaced_modules_share_mutation_type() {
    let tick = |state: &mut Value, by: Value| {
        state["ticks"] = json!(state["ticks"].as_i64().unwrap_or(0) + by.as_i64().unwrap_or(1));
    };

    let store = Store::new(
        ModuleDecl::new()
            .module("a", ModuleDecl::new().state(json!({"ticks": 0})).mutation("increment", tick))
            .module("b", ModuleDecl::new().state(json!({"ticks": 0})).mutation("increment", tick)),
    )
    .unwrap();

    store.commit("increment", json!(5));

    // One commit, both handlers, once each.
    assert_eq!(store.state()["a"]["ticks"], json!(5));
    assert_eq!(store.state()["b"]["ticks"], json!(5));
}

#[test]
fn test_sync_action_value_is_normalized() {
    let store = Store::new(ModuleDecl::new().module(
        "mod",
        ModuleDecl::new()
            .namespaced(true)
            .action("load", |_ctx, _payload| async { Ok(json!(42)) }),
    ))
    .unwrap();

    assert_eq!(
        block_on(store.dispatch("mod/load", Value::Null)).unwrap(),
        json!(42)
    );
}

#[test]
fn test_empty_type_is_noop() {
    let store = Store::new(ModuleDecl::new().module("cart", cart_module())).unwrap();

    store.commit("", json!(1));
    assert_eq!(store.state()["cart"]["items"], json!([]));

    assert_eq!(block_on(store.dispatch("", json!(1))).unwrap(), Value::Null);
}

#[test]
fn test_dispatch_result_order_ignores_completion_timing() {
    let store = Store::new(
        ModuleDecl::new()
            .module(
                "slow",
                ModuleDecl::new().action("fetch", |_ctx, _payload| async {
                    SettleAfter::new(5).await;
                    Ok(json!("slow"))
                }),
            )
            .module(
                "fast",
                ModuleDecl::new().action("fetch", |_ctx, _payload| async { Ok(json!("fast")) }),
            ),
    )
    .unwrap();

    // "slow" registered first, completes last; result order is registration order.
    assert_eq!(
        block_on(store.dispatch("fetch", Value::Null)).unwrap(),
        json!(["slow", "fast"])
    );
}

#[test]
fn test_deep_tree_namespaces_and_state_shape() {
    let leaf = ModuleDecl::new()
        .namespaced(true)
        .state(json!({"value": "leaf"}))
        .mutation("set", |state, v| state["value"] = v);

    let store = Store::new(ModuleDecl::new().state(json!({"app": "demo"})).module(
        "outer",
        ModuleDecl::new()
            .namespaced(true)
            .state(json!({"value": "outer"}))
            .module(
                "plain",
                ModuleDecl::new()
                    .state(json!({"value": "plain"}))
                    .module("leaf", leaf),
            ),
    ))
    .unwrap();

    // State tree mirrors the module tree regardless of namespacing.
    assert_eq!(
        store.state(),
        json!({
            "app": "demo",
            "outer": {
                "value": "outer",
                "plain": {
                    "value": "plain",
                    "leaf": {"value": "leaf"},
                },
            },
        })
    );

    // The unnamespaced middle module contributes nothing to the namespace.
    store.commit("outer/leaf/set", json!("updated"));
    assert_eq!(
        store.state()["outer"]["plain"]["leaf"]["value"],
        json!("updated")
    );

    assert_eq!(
        store.namespaces(),
        vec!["outer/".to_string(), "outer/leaf/".to_string()]
    );
}

#[test]
fn test_getter_sees_local_and_root_scope() {
    let store = Store::new(
        ModuleDecl::new()
            .state(json!({"taxRate": 10}))
            .getter("taxRate", |state, _g, _root, _rg| Ok(state["taxRate"].clone()))
            .module(
                "cart",
                cart_module().getter("taxedCount", |_state, getters, root, root_getters| {
                    let count = getters.get("count")?.as_i64().unwrap_or(0);
                    let rate = root_getters.get("taxRate")?.as_i64().unwrap_or(0);
                    let app = root["taxRate"].as_i64().unwrap_or(0);
                    assert_eq!(rate, app);
                    Ok(json!(count * (100 + rate) / 100))
                }),
            ),
    )
    .unwrap();

    store.commit("cart/addItem", json!({"id": 1}));
    store.commit("cart/addItem", json!({"id": 2}));
    assert_eq!(store.getter("cart/taxedCount").unwrap(), json!(2));
}

#[test]
fn test_action_context_exposes_all_scopes() {
    let store = Store::new(
        ModuleDecl::new()
            .state(json!({"user": "ada"}))
            .module(
                "cart",
                cart_module().action("audit", |ctx, _payload| async move {
                    let count = ctx.getter("count")?;
                    let user = ctx.root_state()["user"].clone();
                    let local_items = ctx.state()["items"].clone();
                    Ok(json!({
                        "count": count,
                        "user": user,
                        "items": local_items,
                        "namespace": ctx.namespace(),
                    }))
                }),
            ),
    )
    .unwrap();

    store.commit("cart/addItem", json!({"id": 7}));
    let report = block_on(store.dispatch("cart/audit", Value::Null)).unwrap();
    assert_eq!(
        report,
        json!({
            "count": 1,
            "user": "ada",
            "items": [{"id": 7}],
            "namespace": "cart/",
        })
    );
}

#[test]
fn test_action_dispatches_nested_action() {
    let store = Store::new(ModuleDecl::new().module(
        "cart",
        cart_module()
            .action("add", |ctx, item| async move {
                ctx.commit("addItem", item);
                ctx.getter("count")
            })
            .action("addTwice", |ctx, item| async move {
                ctx.dispatch("add", item.clone()).await?;
                ctx.dispatch("add", item).await
            }),
    ))
    .unwrap();

    let count = block_on(store.dispatch("cart/addTwice", json!({"id": 1}))).unwrap();
    assert_eq!(count, json!(2));
    assert_eq!(store.getter("cart/count").unwrap(), json!(2));
}

#[test]
fn test_getter_cache_counts_evaluations() {
    let evaluations = Arc::new(AtomicUsize::new(0));
    let evals = Arc::clone(&evaluations);

    let store = Store::new(ModuleDecl::new().module(
        "cart",
        cart_module().getter("size", move |state, _g, _root, _rg| {
            evals.fetch_add(1, Ordering::SeqCst);
            Ok(json!(state["items"].as_array().map_or(0, |a| a.len())))
        }),
    ))
    .unwrap();

    store.getter("cart/size").unwrap();
    store.getter("cart/size").unwrap();
    store.getter("cart/size").unwrap();
    assert_eq!(evaluations.load(Ordering::SeqCst), 1);

    // A commit to an unrelated type leaves the cache warm.
    store.commit("missing", json!(1));
    store.getter("cart/size").unwrap();
    assert_eq!(evaluations.load(Ordering::SeqCst), 1);

    store.commit("cart/addItem", json!({"id": 1}));
    assert_eq!(store.getter("cart/size").unwrap(), json!(1));
    assert_eq!(evaluations.load(Ordering::SeqCst), 2);
}

#[test]
fn test_module_handle_binding_surface() {
    #[derive(Debug, Deserialize)]
    struct CartState {
        items: Vec<Value>,
    }

    let store = Store::new(ModuleDecl::new().module("cart", cart_module())).unwrap();
    let cart = store.module("cart/").unwrap();

    cart.commit("addItem", json!({"id": 1}));
    let typed: CartState = cart.state_as().unwrap();
    assert_eq!(typed.items.len(), 1);

    assert_eq!(cart.getter("count").unwrap(), json!(1));
    assert_eq!(cart.getters().names(), vec!["count".to_string()]);
    assert!(cart.getters().contains("count"));
    assert!(!cart.getters().contains("missing"));

    let value = block_on(cart.dispatch("missing", Value::Null)).unwrap();
    assert_eq!(value, Value::Null);
}

#[test]
fn test_root_getter_bag_is_flat_and_namespaced() {
    let store = Store::new(
        ModuleDecl::new()
            .getter("version", |_s, _g, _root, _rg| Ok(json!(1)))
            .module("cart", cart_module()),
    )
    .unwrap();

    assert_eq!(
        store.getters().names(),
        vec!["cart/count".to_string(), "version".to_string()]
    );
    assert_eq!(store.getters().get("cart/count").unwrap(), json!(0));
}
