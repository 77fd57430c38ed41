//! # Dispatcher Module
//!
//! Request and response types, and the [`Dispatcher`] that turns a request
//! into a response.
//!
//! ## Request Flow
//!
//! 1. **Routing**: the [`Router`](crate::router::Router) matches method and path.
//!    `NotFound` becomes `404`; `MethodNotAllowed` becomes `405` with an
//!    `Allow` header listing the permitted methods.
//! 2. **Chain building**: the [`ChainBuilder`](crate::middleware::ChainBuilder)
//!    resolves global middleware, the route's guards and its action. An unknown
//!    id becomes `500` before anything runs.
//! 3. **Executing**: path parameters are copied into the request attributes and
//!    the chain runs head first. Any element may short-circuit.
//! 4. **Completed**: the response goes back to the transport.
//!
//! ## Error Handling
//!
//! Errors returned from the chain and panics raised inside it are caught at
//! the dispatcher boundary and rendered by an
//! [`ErrorPresenter`](crate::error_page::ErrorPresenter): full detail in
//! development, an opaque `500` in production.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use http::Method;
//! use kickstart::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
//! use kickstart::error_page::ErrorMode;
//! use kickstart::middleware::{action_fn, ChainBuilder};
//! use kickstart::registry::HandlerRegistry;
//! use kickstart::router::{RouteDecl, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.register(RouteDecl::get("/hello/{name}", "hello")).unwrap();
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register_shared(
//!     "hello",
//!     action_fn(|req| {
//!         let name = req.attribute_str("name").unwrap_or("world").to_string();
//!         Ok(HandlerResponse::text(200, format!("hello {name}")))
//!     }),
//! );
//!
//! let dispatcher = Dispatcher::new(
//!     Arc::new(table.into_router()),
//!     ChainBuilder::new(Arc::new(registry)),
//!     ErrorMode::Production,
//! );
//! let res = dispatcher.dispatch(HandlerRequest::new(Method::GET, "/hello/ada"));
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body, "hello ada");
//! ```

mod core;
mod request;
mod response;

pub use core::Dispatcher;
pub use request::{HandlerRequest, HeaderVec, MAX_INLINE_HEADERS};
pub use response::HandlerResponse;
