//! Router core module - the request matching hot path.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::collections::BTreeSet;
use std::sync::Arc;

use http::Method;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use super::pattern::CompiledPattern;
use super::route::Route;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match path.
///
/// Names are `Arc<str>` shared with the compiled pattern; values are
/// per-request data taken from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A successful path + method match.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route, shared with the router
    pub route: Arc<Route>,
    /// URL-decoded placeholder values, keyed by placeholder name
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of matching one request against the table.
#[derive(Debug, Clone)]
pub enum MatchResult {
    /// First route whose path and method both matched
    Matched(RouteMatch),
    /// No route's path matched
    NotFound,
    /// At least one path matched, none with this method
    MethodNotAllowed {
        /// Methods of every path-matching route, sorted and deduplicated
        allowed: Vec<Method>,
    },
}

impl MatchResult {
    /// The route match, if any.
    #[must_use]
    pub fn matched(self) -> Option<RouteMatch> {
        match self {
            MatchResult::Matched(m) => Some(m),
            _ => None,
        }
    }

    /// Render allowed methods for an `Allow` header, e.g. `"GET, POST"`.
    #[must_use]
    pub fn allow_header(allowed: &[Method]) -> String {
        allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Immutable router built from a [`RouteTable`](super::RouteTable).
///
/// Scans routes in registration order; the first route whose path and
/// method both match wins. Routes whose path matches with another method are
/// remembered so a miss can be reported as `405` instead of `404`.
///
/// Shared across threads behind `Arc` with no locking.
#[derive(Debug)]
pub struct Router {
    routes: Vec<(Arc<Route>, CompiledPattern)>,
}

impl Router {
    pub(crate) fn new(routes: Vec<(Arc<Route>, CompiledPattern)>) -> Self {
        // RT5: Routing table loaded
        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|(route, _)| format!("{} {}", route.method, route.pattern))
            .collect();

        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Self { routes }
    }

    /// Match `method` and `path`.
    ///
    /// `path` must not carry a query string; the trailing slash is
    /// significant.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> MatchResult {
        // RT1: Route match attempt
        debug!(method = %method, path = %path, "Route match attempt");

        let match_start = std::time::Instant::now();
        let mut allowed: BTreeSet<&str> = BTreeSet::new();

        for (route, pattern) in &self.routes {
            if route.method != *method {
                if pattern.is_match(path) {
                    allowed.insert(route.method.as_str());
                }
                continue;
            }

            let Some(path_params) = pattern.captures(path) else {
                continue;
            };

            // RT3: Route matched
            let match_duration = match_start.elapsed();
            if match_duration > std::time::Duration::from_millis(1) {
                warn!(
                    method = %method,
                    path = %path,
                    handler_id = %route.handler_id,
                    route_pattern = %route.pattern,
                    duration_us = match_duration.as_micros(),
                    "Slow route matching detected"
                );
            } else {
                debug!(
                    method = %method,
                    path = %path,
                    handler_id = %route.handler_id,
                    route_pattern = %route.pattern,
                    path_params = ?path_params,
                    duration_us = match_duration.as_micros(),
                    "Route matched"
                );
            }

            return MatchResult::Matched(RouteMatch {
                route: Arc::clone(route),
                path_params,
            });
        }

        if allowed.is_empty() {
            // RT4: No route found (404)
            debug!(method = %method, path = %path, "No route matched");
            return MatchResult::NotFound;
        }

        // BTreeSet gives sorted, unique names; parsing them back cannot fail
        let allowed: Vec<Method> = allowed
            .into_iter()
            .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
            .collect();

        debug!(
            method = %method,
            path = %path,
            allowed = %MatchResult::allow_header(&allowed),
            "Path matched with a different method"
        );
        MatchResult::MethodNotAllowed { allowed }
    }

    /// All routes in registration order.
    #[must_use]
    pub fn all_routes(&self) -> Vec<Arc<Route>> {
        self.routes.iter().map(|(r, _)| Arc::clone(r)).collect()
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the router has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// One line per route, in matching order.
    #[must_use]
    pub fn dump_routes(&self) -> Vec<String> {
        self.routes.iter().map(|(r, _)| format!("{} {r}", r.id)).collect()
    }
}
