mod common;

use std::sync::Arc;

use common::router;
use http::Method;
use kickstart::router::{MatchResult, RouteDecl, RouteTable, Router};
use kickstart::RouteError;

fn assert_route_match(router: &Router, method: Method, path: &str, expected_handler: &str) {
    match router.route(&method, path) {
        MatchResult::Matched(m) => {
            assert_eq!(
                m.route.handler_id.as_ref(),
                expected_handler,
                "Handler mismatch for {} {}",
                method,
                path
            );
        }
        other => {
            assert_eq!(
                expected_handler, "<none>",
                "Expected {} {} to match, got {:?}",
                method, path, other
            );
        }
    }
}

fn zoo() -> Router {
    router(vec![
        RouteDecl::get("/", "root_handler"),
        RouteDecl::get("/zoo/animals", "get_animals"),
        RouteDecl::post("/zoo/animals", "create_animal"),
        RouteDecl::get("/zoo/animals/{id:\\d+}", "get_animal"),
        RouteDecl::put("/zoo/animals/{id:\\d+}", "update_animal"),
        RouteDecl::patch("/zoo/animals/{id:\\d+}", "patch_animal"),
        RouteDecl::delete("/zoo/animals/{id:\\d+}", "delete_animal"),
        RouteDecl::new("HEAD", "/zoo/health", "health_check"),
        RouteDecl::new("options", "/zoo/health", "supported_ops"),
    ])
}

#[test]
fn test_router_verbs() {
    let router = zoo();
    assert_route_match(&router, Method::GET, "/", "root_handler");
    assert_route_match(&router, Method::GET, "/zoo/animals", "get_animals");
    assert_route_match(&router, Method::POST, "/zoo/animals", "create_animal");
    assert_route_match(&router, Method::GET, "/zoo/animals/123", "get_animal");
    assert_route_match(&router, Method::PUT, "/zoo/animals/123", "update_animal");
    assert_route_match(&router, Method::PATCH, "/zoo/animals/123", "patch_animal");
    assert_route_match(&router, Method::DELETE, "/zoo/animals/123", "delete_animal");
    assert_route_match(&router, Method::HEAD, "/zoo/health", "health_check");
    assert_route_match(&router, Method::OPTIONS, "/zoo/health", "supported_ops");
    assert_route_match(&router, Method::GET, "/unknown", "<none>");
}

#[test]
fn test_literal_routes_match_without_params() {
    let router = zoo();
    for route in router.all_routes() {
        if route.pattern.contains('{') {
            continue;
        }
        match router.route(&route.method, &route.pattern) {
            MatchResult::Matched(m) => {
                assert!(Arc::ptr_eq(&m.route, &route));
                assert!(m.path_params.is_empty());
            }
            other => panic!("{} did not match itself: {other:?}", route),
        }
    }
}

#[test]
fn test_numeric_constraint() {
    let router = router(vec![RouteDecl::get("/user/{id:\\d+}", "user")]);

    let m = router.route(&Method::GET, "/user/42").matched().unwrap();
    assert_eq!(m.get_path_param("id"), Some("42"));
    assert_eq!(m.path_params.len(), 1);

    assert!(matches!(router.route(&Method::GET, "/user/abc"), MatchResult::NotFound));
}

#[test]
fn test_constraint_failure_falls_through_to_next_route() {
    let router = router(vec![
        RouteDecl::get("/user/{id:\\d+}", "by_id"),
        RouteDecl::get("/user/{name}", "by_name"),
    ]);
    assert_route_match(&router, Method::GET, "/user/42", "by_id");
    assert_route_match(&router, Method::GET, "/user/abc", "by_name");
}

#[test]
fn test_optional_title() {
    let router = router(vec![RouteDecl::get("/project[/{title}]", "project")]);

    let bare = router.route(&Method::GET, "/project").matched().unwrap();
    assert!(bare.path_params.is_empty());

    let titled = router.route(&Method::GET, "/project/foo").matched().unwrap();
    assert_eq!(titled.get_path_param("title"), Some("foo"));
    assert!(Arc::ptr_eq(&bare.route, &titled.route));

    assert!(matches!(router.route(&Method::GET, "/project/"), MatchResult::NotFound));
}

#[test]
fn test_method_not_allowed_lists_methods_once() {
    let router = router(vec![
        RouteDecl::post("/items/{id}", "update"),
        RouteDecl::get("/items/{id}", "show"),
        RouteDecl::get("/items/{slug}", "show_again"),
    ]);

    match router.route(&Method::DELETE, "/items/9") {
        MatchResult::MethodNotAllowed { allowed } => {
            assert_eq!(allowed, vec![Method::GET, Method::POST]);
            assert_eq!(MatchResult::allow_header(&allowed), "GET, POST");
        }
        other => panic!("expected MethodNotAllowed, got {other:?}"),
    }

    assert!(matches!(router.route(&Method::DELETE, "/nothing"), MatchResult::NotFound));
}

#[test]
fn test_first_registered_route_wins() {
    let router = router(vec![
        RouteDecl::get("/files/{path:.+}", "catch_all"),
        RouteDecl::get("/files/readme", "readme"),
    ]);
    assert_route_match(&router, Method::GET, "/files/readme", "catch_all");

    let router = common::router(vec![
        RouteDecl::get("/files/readme", "readme"),
        RouteDecl::get("/files/{path:.+}", "catch_all"),
    ]);
    assert_route_match(&router, Method::GET, "/files/readme", "readme");
    assert_route_match(&router, Method::GET, "/files/a/b", "catch_all");
}

#[test]
fn test_round_trip_yields_registered_route() {
    let mut table = RouteTable::new();
    let patterns = ["/", "/a", "/a/b", "/about-us", "/v1.0/status"];
    let registered: Vec<_> = patterns
        .iter()
        .map(|p| table.register(RouteDecl::get(*p, "h")).unwrap())
        .collect();
    let router = table.into_router();

    for route in registered {
        let m = router.route(&Method::GET, &route.pattern).matched().unwrap();
        assert!(Arc::ptr_eq(&m.route, &route), "{} matched {}", route, m.route);
        assert_eq!(m.route.id, route.id);
    }
}

#[test]
fn test_trailing_slash_is_significant() {
    let router = router(vec![RouteDecl::get("/about", "about")]);
    assert_route_match(&router, Method::GET, "/about", "about");
    assert_route_match(&router, Method::GET, "/about/", "<none>");
}

#[test]
fn test_params_are_url_decoded() {
    let router = router(vec![RouteDecl::get("/tags/{tag}", "tag")]);
    let m = router.route(&Method::GET, "/tags/rust%20lang").matched().unwrap();
    assert_eq!(m.get_path_param("tag"), Some("rust lang"));
}

#[test]
fn test_base_href_and_groups() {
    let mut table = RouteTable::with_base_href("/app/");
    table.register(RouteDecl::get("/[{name}]", "welcome")).unwrap();
    table
        .group("/admin", ["auth"], |t| {
            t.register(RouteDecl::get("/users", "users").guard("audit"))?;
            t.group("/reports", ["reporting"], |t| {
                t.register(RouteDecl::get("/{year:\\d{4}}", "report"))?;
                Ok(())
            })
        })
        .unwrap();
    table.register(RouteDecl::get("/after", "after")).unwrap();
    let router = table.into_router();

    assert_route_match(&router, Method::GET, "/app/", "welcome");
    assert_route_match(&router, Method::GET, "/app/ada", "welcome");
    assert_route_match(&router, Method::GET, "/app", "<none>");

    let users = router.route(&Method::GET, "/app/admin/users").matched().unwrap();
    let guards: Vec<&str> = users.route.guard_ids.iter().map(|g| g.as_ref()).collect();
    assert_eq!(guards, vec!["auth", "audit"]);

    let report = router.route(&Method::GET, "/app/admin/reports/2024").matched().unwrap();
    let guards: Vec<&str> = report.route.guard_ids.iter().map(|g| g.as_ref()).collect();
    assert_eq!(guards, vec!["auth", "reporting"]);
    assert_eq!(report.get_path_param("year"), Some("2024"));

    // Group state does not leak into later registrations
    let after = router.route(&Method::GET, "/app/after").matched().unwrap();
    assert!(after.route.guard_ids.is_empty());
}

#[test]
fn test_invalid_routes_rejected_at_registration() {
    let mut table = RouteTable::new();
    let cases = [
        "/a/{id}/{id}",
        "/a/{id:[0-9}",
        "/a[/b",
        "/a/b]",
        "/a[/{x}]/c",
        "/a/{}",
    ];
    for pattern in cases {
        let err = table.register(RouteDecl::get(pattern, "h")).unwrap_err();
        assert!(
            matches!(&err, RouteError::InvalidRoute { pattern: p, .. } if p == pattern),
            "{pattern}: {err}"
        );
    }
    assert!(table.is_empty());
}

#[test]
fn test_invalid_method_rejected() {
    let mut table = RouteTable::new();
    let err = table.register(RouteDecl::new("", "/a", "h")).unwrap_err();
    assert!(matches!(err, RouteError::InvalidRoute { .. }));
}

#[test]
fn test_router_shared_across_threads() {
    let router = Arc::new(zoo());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || {
                for n in 0..200 {
                    let path = format!("/zoo/animals/{}", i * 1000 + n);
                    let m = router.route(&Method::GET, &path).matched().unwrap();
                    assert_eq!(m.get_path_param("id"), Some((i * 1000 + n).to_string().as_str()));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}
