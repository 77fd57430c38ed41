//! # Server Module
//!
//! A small blocking HTTP transport built on `tiny_http`. It only converts
//! between wire requests and [`HandlerRequest`](crate::dispatcher::HandlerRequest)
//! / [`HandlerResponse`](crate::dispatcher::HandlerResponse); routing, guards
//! and error rendering all happen in the [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! ```rust,no_run
//! # fn run(dispatcher: std::sync::Arc<kickstart::dispatcher::Dispatcher>) -> std::io::Result<()> {
//! use kickstart::server::HttpServer;
//!
//! let handle = HttpServer::new(dispatcher, 4).start("127.0.0.1:8080")?;
//! handle.wait_ready()?;
//! handle.stop();
//! # Ok(())
//! # }
//! ```

mod http_server;
mod request;
mod response;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{build_request, parse_body, read_body, TransportError, MAX_BODY_BYTES};
