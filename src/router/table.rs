//! The route table: ordered, validated route registration.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use super::core::Router;
use super::pattern::CompiledPattern;
use super::route::{parse_method, GroupDecl, Route, RouteDecl, RouteId};
use crate::error::RouteError;

/// Ordered set of routes, built once at startup.
///
/// Registration order is matching order. The table only grows; call
/// [`RouteTable::into_router`] to freeze it before serving.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<(Arc<Route>, CompiledPattern)>,
    /// Prefix and leading guards of the group currently being declared
    prefix: String,
    guards: Vec<String>,
}

/// Shape of a routes file.
#[derive(Debug, Default, Deserialize)]
struct RoutesFile {
    #[serde(default)]
    routes: Vec<RouteDecl>,
    #[serde(default)]
    groups: Vec<GroupDecl>,
}

impl RouteTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table whose routes all start with `base_href`.
    #[must_use]
    pub fn with_base_href(base_href: &str) -> Self {
        Self {
            prefix: normalize_prefix(base_href),
            ..Self::default()
        }
    }

    /// Validate, compile and append a route.
    ///
    /// Inside a [`group`](Self::group), the group prefix is prepended to the
    /// path and the group guards run before the route's own.
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidRoute`] if the method is empty or malformed, or the
    /// pattern fails validation.
    pub fn register(&mut self, decl: RouteDecl) -> Result<Arc<Route>, RouteError> {
        let pattern = format!("{}{}", self.prefix, decl.path);
        let method = parse_method(&pattern, &decl.method)?;
        let compiled = CompiledPattern::compile(&pattern)?;

        let guard_ids = self
            .guards
            .iter()
            .chain(decl.guards.iter())
            .map(|g| Arc::<str>::from(g.as_str()))
            .collect();

        let route = Arc::new(Route {
            id: RouteId(self.entries.len()),
            method,
            pattern,
            handler_id: Arc::from(decl.handler.as_str()),
            guard_ids,
            name: decl.name,
        });

        debug!(
            route_id = %route.id,
            method = %route.method,
            pattern = %route.pattern,
            handler_id = %route.handler_id,
            guard_count = route.guard_ids.len(),
            "Route registered"
        );

        self.entries.push((Arc::clone(&route), compiled));
        Ok(route)
    }

    /// Register several routes, stopping at the first invalid one.
    ///
    /// # Errors
    ///
    /// The first [`RouteError`] encountered.
    pub fn register_all<I>(&mut self, decls: I) -> Result<(), RouteError>
    where
        I: IntoIterator<Item = RouteDecl>,
    {
        for decl in decls {
            self.register(decl)?;
        }
        Ok(())
    }

    /// Declare a group of routes sharing `prefix` and leading `guards`.
    ///
    /// ```
    /// use kickstart::router::{RouteDecl, RouteTable};
    ///
    /// let mut table = RouteTable::new();
    /// table
    ///     .group("/admin", ["auth"], |admin| {
    ///         admin.register(RouteDecl::get("/users", "list_users"))?;
    ///         Ok(())
    ///     })
    ///     .unwrap();
    /// let route = &table.all_routes()[0];
    /// assert_eq!(route.pattern, "/admin/users");
    /// assert_eq!(&*route.guard_ids[0], "auth");
    /// ```
    ///
    /// # Errors
    ///
    /// Whatever the closure returns.
    pub fn group<I, S, F>(&mut self, prefix: &str, guards: I, f: F) -> Result<(), RouteError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(&mut RouteTable) -> Result<(), RouteError>,
    {
        let saved_prefix = self.prefix.clone();
        let saved_guards_len = self.guards.len();

        self.prefix.push_str(&normalize_prefix(prefix));
        self.guards.extend(guards.into_iter().map(Into::into));

        let result = f(self);

        self.prefix = saved_prefix;
        self.guards.truncate(saved_guards_len);
        result
    }

    fn register_group(&mut self, group: GroupDecl) -> Result<(), RouteError> {
        let GroupDecl {
            prefix,
            guards,
            routes,
            groups,
        } = group;
        self.group(&prefix, guards, |table| {
            table.register_all(routes)?;
            for nested in groups {
                table.register_group(nested)?;
            }
            Ok(())
        })
    }

    /// Load declarations from a YAML (`.yaml`, `.yml`) or TOML (`.toml`) file.
    ///
    /// The file has optional top-level `routes` and `groups` lists; plain
    /// routes are registered before groups. Every pattern is prefixed with
    /// `base_href`.
    ///
    /// # Errors
    ///
    /// [`RouteError::Load`] when the file cannot be read or parsed, and
    /// [`RouteError::InvalidRoute`] for any invalid declaration.
    pub fn from_file(path: &Path, base_href: &str) -> Result<Self, RouteError> {
        let load_err = |reason: String| RouteError::Load {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;

        let file: RoutesFile = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| load_err(e.to_string()))?,
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| load_err(e.to_string()))?
            }
            other => {
                return Err(load_err(format!(
                    "unsupported routes file extension {other:?}, expected yaml, yml or toml"
                )))
            }
        };

        let mut table = Self::with_base_href(base_href);
        table.register_all(file.routes)?;
        for group in file.groups {
            table.register_group(group)?;
        }

        info!(
            path = %path.display(),
            routes_count = table.len(),
            base_href = %base_href,
            "Route declarations loaded"
        );
        Ok(table)
    }

    /// All routes in registration order.
    #[must_use]
    pub fn all_routes(&self) -> Vec<Arc<Route>> {
        self.entries.iter().map(|(r, _)| Arc::clone(r)).collect()
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no route has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the table into a read-only [`Router`].
    #[must_use]
    pub fn into_router(self) -> Router {
        Router::new(self.entries)
    }
}

/// `"/app/"` -> `"/app"`, `"app"` -> `"/app"`, `""` and `"/"` -> `""`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
