#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kickstart::dispatcher::{Dispatcher, HandlerResponse};
use kickstart::error_page::ErrorMode;
use kickstart::middleware::{action_fn, middleware_fn, ChainBuilder, Middleware};
use kickstart::registry::HandlerRegistry;
use kickstart::router::{RouteDecl, RouteTable, Router};

/// Compile declarations into a router, panicking on invalid routes.
pub fn router(decls: Vec<RouteDecl>) -> Router {
    let mut table = RouteTable::new();
    table.register_all(decls).unwrap();
    table.into_router()
}

pub fn dispatcher(decls: Vec<RouteDecl>, registry: HandlerRegistry, mode: ErrorMode) -> Dispatcher {
    Dispatcher::new(
        Arc::new(router(decls)),
        ChainBuilder::new(Arc::new(registry)),
        mode,
    )
}

/// Action answering `200 <name>` and counting its invocations.
pub fn counting_action(name: &'static str, hits: &Arc<AtomicUsize>) -> Arc<dyn Middleware> {
    let hits = Arc::clone(hits);
    action_fn(move |_req| {
        hits.fetch_add(1, Ordering::SeqCst);
        Ok(HandlerResponse::text(200, name))
    })
}

/// Pass-through guard counting its invocations.
pub fn counting_guard(hits: &Arc<AtomicUsize>) -> Arc<dyn Middleware> {
    let hits = Arc::clone(hits);
    middleware_fn(move |req, next| {
        hits.fetch_add(1, Ordering::SeqCst);
        next.run(req)
    })
}

/// Guard that appends `label` to the `trail` attribute before continuing.
pub fn trail_guard(label: &'static str) -> Arc<dyn Middleware> {
    middleware_fn(move |req, next| {
        let trail = req.attribute_str("trail").unwrap_or("").to_string();
        req.set_attribute("trail", serde_json::Value::String(format!("{trail}{label}")));
        next.run(req)
    })
}

pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn hits(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
