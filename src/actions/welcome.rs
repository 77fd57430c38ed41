use std::sync::Arc;

use anyhow::Context;
use serde_json::json;

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::middleware::{Middleware, Next};
use crate::render::{Renderer, WELCOME_TEMPLATE};

/// Starter HTML page greeting `name`.
///
/// The name comes from a `{name}` path parameter, then the `name` query
/// parameter, and defaults to `World`.
pub struct WelcomeAction {
    renderer: Arc<dyn Renderer>,
}

impl WelcomeAction {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }
}

impl Middleware for WelcomeAction {
    fn process(&self, req: &mut HandlerRequest, _next: Next<'_>) -> anyhow::Result<HandlerResponse> {
        let name = req
            .attribute_str("name")
            .or_else(|| req.get_query_param("name"))
            .filter(|n| !n.is_empty())
            .unwrap_or("World");
        let route = req.route().map(|r| r.to_string());

        let html = self
            .renderer
            .render(WELCOME_TEMPLATE, &json!({ "name": name, "route": route }))
            .context("Welcome page failed to render")?;
        Ok(HandlerResponse::html(200, html))
    }
}
