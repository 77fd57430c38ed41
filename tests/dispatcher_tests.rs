mod common;

use std::sync::Arc;

use common::{counter, counting_action, dispatcher, hits};
use http::Method;
use kickstart::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
use kickstart::error::Fault;
use kickstart::error_page::{ErrorMode, ErrorPresenter};
use kickstart::middleware::{action_fn, middleware_fn, ChainBuilder};
use kickstart::registry::HandlerRegistry;
use kickstart::router::RouteDecl;
use serde_json::{json, Value};

fn registry_with(id: &str, action: Arc<dyn kickstart::middleware::Middleware>) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register_shared(id, action);
    registry
}

#[test]
fn test_not_found() {
    let d = dispatcher(
        vec![RouteDecl::get("/a", "a")],
        registry_with("a", action_fn(|_| Ok(HandlerResponse::empty(204)))),
        ErrorMode::Production,
    );
    let res = d.dispatch(HandlerRequest::new(Method::GET, "/b"));
    assert_eq!(res.status, 404);
    assert_eq!(res.body, json!({"error": "Not Found"}));
}

#[test]
fn test_method_not_allowed_sets_allow_header() {
    let ok = action_fn(|_| Ok(HandlerResponse::empty(204)));
    let mut registry = HandlerRegistry::new();
    registry.register_shared("ok", ok);
    let d = dispatcher(
        vec![
            RouteDecl::post("/thing/{id}", "ok"),
            RouteDecl::get("/thing/{id}", "ok"),
            RouteDecl::get("/thing/{other}", "ok"),
        ],
        registry,
        ErrorMode::Production,
    );

    let res = d.dispatch(HandlerRequest::new(Method::DELETE, "/thing/1"));
    assert_eq!(res.status, 405);
    let allow: Vec<&str> = res
        .get_header("allow")
        .unwrap()
        .split(", ")
        .collect();
    assert_eq!(allow, vec!["GET", "POST"]);
}

#[test]
fn test_params_become_attributes() {
    let d = dispatcher(
        vec![RouteDecl::get("/users/{id:\\d+}/posts[/{slug}]", "show")],
        registry_with(
            "show",
            action_fn(|req| {
                Ok(HandlerResponse::json(
                    200,
                    json!({
                        "id": req.attribute("id"),
                        "slug": req.attribute("slug"),
                        "handler": req.route().map(|r| r.handler_id.to_string()),
                    }),
                ))
            }),
        ),
        ErrorMode::Production,
    );

    let res = d.dispatch(HandlerRequest::new(Method::GET, "/users/7/posts/hello%2Fworld"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!({"id": "7", "slug": "hello/world", "handler": "show"}));

    let res = d.dispatch(HandlerRequest::new(Method::GET, "/users/7/posts"));
    assert_eq!(res.body["slug"], Value::Null);
}

#[test]
fn test_unresolved_action_is_500_in_both_modes() {
    for (mode, detailed) in [(ErrorMode::Development, true), (ErrorMode::Production, false)] {
        let d = dispatcher(
            vec![RouteDecl::get("/", "nobody")],
            HandlerRegistry::new(),
            mode,
        );
        let res = d.dispatch(HandlerRequest::new(Method::GET, "/"));
        assert_eq!(res.status, 500);
        let body = res.body.to_string();
        assert_eq!(body.contains("nobody"), detailed, "{mode}: {body}");
    }
}

#[test]
fn test_error_rendering_depends_on_mode() {
    let failing = || action_fn(|_| Err(anyhow::anyhow!("disk on fire").context("saving user")));

    let dev = dispatcher(
        vec![RouteDecl::post("/users", "save")],
        registry_with("save", failing()),
        ErrorMode::Development,
    );
    let res = dev.dispatch(HandlerRequest::new(Method::POST, "/users"));
    assert_eq!(res.status, 500);
    assert_eq!(res.body["message"], "saving user");
    assert_eq!(res.body["causes"], json!(["saving user", "disk on fire"]));
    assert_eq!(res.body["route"], "POST /users -> save");

    let prod = dispatcher(
        vec![RouteDecl::post("/users", "save")],
        registry_with("save", failing()),
        ErrorMode::Production,
    );
    let req = HandlerRequest::new(Method::POST, "/users");
    let request_id = req.request_id.to_string();
    let res = prod.dispatch(req);
    assert_eq!(res.status, 500);
    assert!(!res.body.to_string().contains("disk on fire"));
    assert_eq!(res.body["request_id"], request_id);
}

#[test]
fn test_panic_in_guard_is_caught() {
    let action_hits = counter();
    let mut registry = HandlerRegistry::new();
    registry.register_shared(
        "explode",
        middleware_fn(|req, _next| {
            if req.path == "/boom" {
                panic!("guard exploded");
            }
            Ok(HandlerResponse::empty(204))
        }),
    );
    registry.register_shared("act", counting_action("never", &action_hits));

    let d = dispatcher(
        vec![RouteDecl::get("/boom", "act").guard("explode")],
        registry,
        ErrorMode::Development,
    );
    let res = d.dispatch(HandlerRequest::new(Method::GET, "/boom"));
    assert_eq!(res.status, 500);
    assert_eq!(res.body["panic"], true);
    assert_eq!(res.body["message"], "panic: guard exploded");
    assert_eq!(hits(&action_hits), 0);

    // The dispatcher keeps serving after a panic
    let res = d.dispatch(HandlerRequest::new(Method::GET, "/boom"));
    assert_eq!(res.status, 500);
}

#[test]
fn test_guard_error_can_be_handled_by_outer_guard() {
    let mut registry = HandlerRegistry::new();
    registry.register_shared(
        "rescue",
        middleware_fn(|req, next| match next.run(req) {
            Ok(res) => Ok(res),
            Err(e) => Ok(HandlerResponse::error(503, &e.to_string())),
        }),
    );
    registry.register_shared("fail", action_fn(|_| anyhow::bail!("backend down")));

    let d = dispatcher(
        vec![RouteDecl::get("/", "fail").guard("rescue")],
        registry,
        ErrorMode::Production,
    );
    let res = d.dispatch(HandlerRequest::new(Method::GET, "/"));
    assert_eq!(res.status, 503);
    assert_eq!(res.body["error"], "backend down");
}

struct TeapotPresenter;

impl ErrorPresenter for TeapotPresenter {
    fn present(&self, fault: &Fault, _req: &HandlerRequest) -> HandlerResponse {
        HandlerResponse::text(500, format!("custom: {fault}"))
    }
}

#[test]
fn test_custom_presenter() {
    let router = common::router(vec![RouteDecl::get("/", "fail")]);
    let registry = registry_with("fail", action_fn(|_| anyhow::bail!("broken")));
    let d = Dispatcher::with_presenter(
        Arc::new(router),
        ChainBuilder::new(Arc::new(registry)),
        Arc::new(TeapotPresenter),
    );
    let res = d.dispatch(HandlerRequest::new(Method::GET, "/"));
    assert_eq!(res.body, "custom: broken");
}

#[test]
fn test_registration_order_decides_handler() {
    let first = counter();
    let second = counter();
    let mut registry = HandlerRegistry::new();
    registry.register_shared("first", counting_action("first", &first));
    registry.register_shared("second", counting_action("second", &second));

    let d = dispatcher(
        vec![
            RouteDecl::get("/p/{any}", "first"),
            RouteDecl::get("/p/fixed", "second"),
        ],
        registry,
        ErrorMode::Production,
    );
    let res = d.dispatch(HandlerRequest::new(Method::GET, "/p/fixed"));
    assert_eq!(res.body, "first");
    assert_eq!((hits(&first), hits(&second)), (1, 0));
}

#[test]
fn test_concurrent_dispatch() {
    let d = Arc::new(dispatcher(
        vec![RouteDecl::get("/n/{n:\\d+}", "echo")],
        registry_with(
            "echo",
            action_fn(|req| {
                let n = req.attribute_str("n").unwrap_or_default().to_string();
                Ok(HandlerResponse::text(200, n))
            }),
        ),
        ErrorMode::Production,
    ));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let d = Arc::clone(&d);
            std::thread::spawn(move || {
                for i in 0..100 {
                    let n = t * 1000 + i;
                    let res = d.dispatch(HandlerRequest::new(Method::GET, format!("/n/{n}")));
                    assert_eq!(res.body, Value::String(n.to_string()));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}
