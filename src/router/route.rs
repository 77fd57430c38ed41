//! Route values and the declarations they are built from.

use std::fmt;
use std::sync::Arc;

use http::Method;
use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// Position of a route in its table, assigned at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RouteId(pub usize);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered route. Immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Registration index
    pub id: RouteId,
    /// Upper-case HTTP method
    pub method: Method,
    /// Path template, including any group prefix
    pub pattern: String,
    /// Opaque id of the terminal action, resolved per request
    pub handler_id: Arc<str>,
    /// Ordered guard ids, resolved per request
    pub guard_ids: Vec<Arc<str>>,
    /// Optional human readable name
    pub name: Option<String>,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.method, self.pattern, self.handler_id)?;
        if !self.guard_ids.is_empty() {
            let guards: Vec<&str> = self.guard_ids.iter().map(AsRef::as_ref).collect();
            write!(f, " [{}]", guards.join(", "))?;
        }
        Ok(())
    }
}

/// Normalize a declared method: trimmed, upper-cased, and a valid HTTP token.
pub(crate) fn parse_method(pattern: &str, raw: &str) -> Result<Method, RouteError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RouteError::invalid(pattern, "empty HTTP method"));
    }
    Method::from_bytes(trimmed.to_ascii_uppercase().as_bytes())
        .map_err(|_| RouteError::invalid(pattern, format!("invalid HTTP method `{trimmed}`")))
}

/// Declaration of a single route, as written by the application or loaded
/// from a routes file.
///
/// ```
/// use kickstart::router::RouteDecl;
///
/// let decl = RouteDecl::get("/user/{id:\\d+}", "show_user").guard("auth");
/// assert_eq!(decl.method, "GET");
/// assert_eq!(decl.guards, vec!["auth".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteDecl {
    /// HTTP method, any case
    pub method: String,
    /// Path template
    #[serde(alias = "pattern")]
    pub path: String,
    /// Action id
    pub handler: String,
    /// Guard ids in execution order
    #[serde(default)]
    pub guards: Vec<String>,
    /// Optional route name
    #[serde(default)]
    pub name: Option<String>,
}

impl RouteDecl {
    /// Declare a route for an arbitrary method.
    pub fn new(method: impl Into<String>, path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            handler: handler.into(),
            guards: Vec::new(),
            name: None,
        }
    }

    /// `GET` route
    pub fn get(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new("GET", path, handler)
    }

    /// `POST` route
    pub fn post(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new("POST", path, handler)
    }

    /// `PUT` route
    pub fn put(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new("PUT", path, handler)
    }

    /// `PATCH` route
    pub fn patch(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new("PATCH", path, handler)
    }

    /// `DELETE` route
    pub fn delete(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new("DELETE", path, handler)
    }

    /// Append one guard.
    #[must_use]
    pub fn guard(mut self, id: impl Into<String>) -> Self {
        self.guards.push(id.into());
        self
    }

    /// Append several guards, keeping their order.
    #[must_use]
    pub fn guards<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guards.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Name the route.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A group of routes sharing a path prefix and leading guards.
///
/// Groups nest: an inner group's prefix and guards are appended to the outer
/// group's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupDecl {
    /// Prefix prepended to each member path
    #[serde(default)]
    pub prefix: String,
    /// Guards run before each member's own guards
    #[serde(default)]
    pub guards: Vec<String>,
    /// Member routes
    #[serde(default)]
    pub routes: Vec<RouteDecl>,
    /// Nested groups
    #[serde(default)]
    pub groups: Vec<GroupDecl>,
}
