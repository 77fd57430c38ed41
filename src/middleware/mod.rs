//! # Middleware Module
//!
//! Every element of a request chain, whether global middleware, a route
//! guard or the terminal action, implements the same [`Middleware`] trait.
//! [`ChainBuilder`] assembles the chain for a matched route and
//! [`MiddlewareChain`] runs it.
//!
//! ## Bundled Middleware
//!
//! - [`TracingMiddleware`] - request span with status and latency
//! - [`MetricsMiddleware`] - request counts, latency and status classes
//! - [`TokenGuard`] - `401` unless the `authorization` header matches
//!
//! ## Writing a Guard
//!
//! ```rust
//! use kickstart::dispatcher::HandlerResponse;
//! use kickstart::middleware::middleware_fn;
//!
//! let admin_only = middleware_fn(|req, next| {
//!     if req.get_header("x-role") == Some("admin") {
//!         next.run(req)
//!     } else {
//!         Ok(HandlerResponse::error(403, "Forbidden"))
//!     }
//! });
//! # let _ = admin_only;
//! ```

mod auth;
mod chain;
mod core;
mod metrics;
mod tracing;

pub use auth::TokenGuard;
pub use chain::{ChainBuilder, ElementKind, MiddlewareChain, Next};
pub use core::{action_fn, middleware_fn, FnAction, FnMiddleware, Middleware};
pub use metrics::{MetricsMiddleware, MetricsSnapshot};
pub use tracing::TracingMiddleware;
