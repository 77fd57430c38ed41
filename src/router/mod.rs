//! # Router Module
//!
//! Route declaration, pattern compilation and request matching.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Validating route declarations at startup ([`RouteTable`])
//! - Compiling path patterns with placeholders and optional tails ([`CompiledPattern`])
//! - Matching `(method, path)` pairs to routes and extracting parameters ([`Router`])
//!
//! ## Architecture
//!
//! Two phases:
//!
//! 1. **Registration**: each [`RouteDecl`] is validated and its pattern compiled
//!    into an anchored regex. Invalid routes fail with
//!    [`RouteError::InvalidRoute`](crate::error::RouteError) and the
//!    application must not start.
//!
//! 2. **Matching**: the frozen [`Router`] scans routes in registration order and
//!    returns a [`MatchResult`]: `Matched`, `NotFound`, or `MethodNotAllowed`
//!    with the allowed methods.
//!
//! ## Example
//!
//! ```rust
//! use kickstart::router::{MatchResult, RouteDecl, RouteTable};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table.register(RouteDecl::get("/user/{id:\\d+}", "show_user")).unwrap();
//! table.register(RouteDecl::get("/project[/{title}]", "show_project")).unwrap();
//! let router = table.into_router();
//!
//! match router.route(&Method::GET, "/user/42") {
//!     MatchResult::Matched(m) => assert_eq!(m.get_path_param("id"), Some("42")),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod core;
mod pattern;
mod route;
mod table;

pub use core::{MatchResult, ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use pattern::{CompiledPattern, Segment, DEFAULT_PARAM_REGEX};
pub use route::{GroupDecl, Route, RouteDecl, RouteId};
pub use table::RouteTable;
