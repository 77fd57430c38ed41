//! Wiring of the bundled pieces into a ready-to-serve [`Dispatcher`].
//!
//! The route table comes from a declaration file; the handler ids it may
//! reference are the ones registered by [`builtin_registry`]:
//!
//! | id            | kind   | registered when            |
//! |---------------|--------|----------------------------|
//! | `echo`        | action | always                     |
//! | `welcome`     | action | always                     |
//! | `metrics`     | action | always                     |
//! | `token_guard` | guard  | `APP_GUARD_TOKEN` is set   |

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::actions::{EchoAction, WelcomeAction};
use crate::config::AppConfig;
use crate::dispatcher::{Dispatcher, HandlerResponse};
use crate::middleware::{
    action_fn, ChainBuilder, MetricsMiddleware, Middleware, TokenGuard, TracingMiddleware,
};
use crate::registry::HandlerRegistry;
use crate::render::MiniJinjaRenderer;
use crate::router::{RouteTable, Router};

/// A dispatcher plus handles to its shared state.
pub struct App {
    pub dispatcher: Arc<Dispatcher>,
    pub metrics: Arc<MetricsMiddleware>,
}

/// Registry holding the bundled actions and guards.
///
/// # Errors
///
/// The bundled templates fail to compile.
pub fn builtin_registry(config: &AppConfig, metrics: &Arc<MetricsMiddleware>) -> Result<HandlerRegistry> {
    let mut registry = HandlerRegistry::new();
    let renderer = Arc::new(MiniJinjaRenderer::new()?);

    registry.register("echo", EchoAction);
    registry.register("welcome", WelcomeAction::new(renderer));

    let counters = Arc::clone(metrics);
    registry.register_shared(
        "metrics",
        action_fn(move |_req| {
            let snapshot = serde_json::to_value(counters.snapshot())?;
            Ok(HandlerResponse::json(200, snapshot))
        }),
    );

    match &config.guard_token {
        Some(token) => registry.register("token_guard", TokenGuard::new(token.as_str())),
        None => warn!("APP_GUARD_TOKEN not set; routes using token_guard will fail"),
    }

    Ok(registry)
}

/// Handler ids referenced by `router` that `registry` cannot resolve,
/// sorted and deduplicated.
pub fn unresolved_ids(router: &Router, registry: &HandlerRegistry) -> Vec<String> {
    let mut missing = BTreeSet::new();
    for route in router.all_routes() {
        for id in route.guard_ids.iter().chain(std::iter::once(&route.handler_id)) {
            if !registry.contains(id) {
                missing.insert(id.to_string());
            }
        }
    }
    missing.into_iter().collect()
}

/// Chain builder with `tracing` and `metrics` as global middleware, in that
/// order.
pub fn builtin_chains(registry: HandlerRegistry, metrics: &Arc<MetricsMiddleware>) -> ChainBuilder {
    let metrics_mw: Arc<dyn Middleware> = Arc::<MetricsMiddleware>::clone(metrics);
    ChainBuilder::new(Arc::new(registry))
        .with_global("tracing", Arc::new(TracingMiddleware))
        .with_global("metrics", metrics_mw)
}

/// Dispatcher over `router` using [`builtin_chains`].
pub fn build_dispatcher(
    config: &AppConfig,
    router: Router,
    registry: HandlerRegistry,
    metrics: &Arc<MetricsMiddleware>,
) -> Dispatcher {
    let chains = builtin_chains(registry, metrics);
    info!(globals = ?chains.global_ids(), "Global middleware installed");
    Dispatcher::new(Arc::new(router), chains, config.mode)
}

/// Load `routes_file`, register the bundled handlers and build the
/// dispatcher.
///
/// # Errors
///
/// The route file cannot be loaded or contains an invalid route.
pub fn bootstrap(config: &AppConfig, routes_file: &Path) -> Result<App> {
    let table = RouteTable::from_file(routes_file, &config.base_href)
        .with_context(|| format!("Failed to load routes from {}", routes_file.display()))?;
    let router = table.into_router();

    let metrics = Arc::new(MetricsMiddleware::new());
    let registry = builtin_registry(config, &metrics)?;

    let missing = unresolved_ids(&router, &registry);
    if !missing.is_empty() {
        warn!(ids = ?missing, "Routes reference unknown handlers; they will answer 500");
    }

    info!(
        routes = router.len(),
        mode = %config.mode,
        base_href = %config.base_href,
        "Application bootstrapped"
    );

    let dispatcher = build_dispatcher(config, router, registry, &metrics);
    Ok(App {
        dispatcher: Arc::new(dispatcher),
        metrics,
    })
}
