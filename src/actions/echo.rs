use serde_json::{json, Map, Value};

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::middleware::{Middleware, Next};

/// Echoes the method, path, matched parameters, query and body as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoAction;

impl Middleware for EchoAction {
    fn process(&self, req: &mut HandlerRequest, _next: Next<'_>) -> anyhow::Result<HandlerResponse> {
        let (handler, route) = match req.route() {
            Some(route) => (
                Value::String(route.handler_id.to_string()),
                Value::String(route.pattern.clone()),
            ),
            None => (Value::Null, Value::Null),
        };

        let params: Map<String, Value> = req
            .path_params()
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect();

        let query: Map<String, Value> = req
            .query_params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect();

        Ok(HandlerResponse::json(
            200,
            json!({
                "request_id": req.request_id.to_string(),
                "handler": handler,
                "route": route,
                "method": req.method.as_str(),
                "path": req.path,
                "params": params,
                "query": query,
                "body": req.body,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::Method;

    use crate::dispatcher::{Dispatcher, HandlerRequest};
    use crate::error_page::ErrorMode;
    use crate::middleware::ChainBuilder;
    use crate::registry::HandlerRegistry;
    use crate::router::{RouteDecl, RouteTable};

    use super::EchoAction;

    #[test]
    fn test_echo_reflects_params_and_query() {
        let mut table = RouteTable::new();
        table
            .register(RouteDecl::get("/items/{id:\\d+}[/{slug}]", "echo"))
            .unwrap();
        let mut registry = HandlerRegistry::new();
        registry.register("echo", EchoAction);

        let dispatcher = Dispatcher::new(
            Arc::new(table.into_router()),
            ChainBuilder::new(Arc::new(registry)),
            ErrorMode::Production,
        );
        let res = dispatcher.dispatch(HandlerRequest::from_target(Method::GET, "/items/7?x=1&x=2"));

        assert_eq!(res.status, 200);
        assert_eq!(res.body["handler"], "echo");
        assert_eq!(res.body["params"]["id"], "7");
        assert!(res.body["params"].get("slug").is_none());
        assert_eq!(res.body["query"]["x"], "2");
        assert_eq!(res.body["method"], "GET");
    }
}
