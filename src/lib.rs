//! # kickstart
//!
//! **kickstart** is a small HTTP routing and dispatch core: a static route
//! table with FastRoute-style patterns, and a per-request chain of guards
//! ending in an action.
//!
//! ## Overview
//!
//! Routes are declared once at startup, in code or in a YAML/TOML file, and
//! compiled into an immutable [`Router`](router::Router). For every request
//! the [`Dispatcher`](dispatcher::Dispatcher) matches method and path, builds
//! a fresh [`MiddlewareChain`](middleware::MiddlewareChain) of
//! `[global middleware, route guards, action]` and runs it. Any element may
//! answer early; errors and panics are caught and rendered by an
//! [`ErrorPresenter`](error_page::ErrorPresenter).
//!
//! ## Architecture
//!
//! - **[`router`]** - Pattern compilation, the route table and matching
//! - **[`middleware`]** - The [`Middleware`](middleware::Middleware) trait, chains, bundled middleware
//! - **[`registry`]** - Resolving handler ids to instances
//! - **[`dispatcher`]** - Request/response types and the per-request state machine
//! - **[`error_page`]** - Development and production fault rendering
//! - **[`actions`]** / **[`render`]** - Bundled actions and template rendering
//! - **[`config`]** / **[`logging`]** - Environment configuration and `tracing` setup
//! - **[`server`]** - A blocking `tiny_http` transport
//! - **[`cli`]** - The `kickstart` binary
//!
//! ## Pattern Syntax
//!
//! | Pattern                     | Matches                         | Parameters             |
//! |-----------------------------|---------------------------------|------------------------|
//! | `/users`                    | `/users`                        |                        |
//! | `/users/{id}`               | `/users/42`                     | `id = "42"`            |
//! | `/users/{id:\d+}`           | `/users/42`, not `/users/ada`   | `id = "42"`            |
//! | `/project[/{title}]`        | `/project`, `/project/x`        | `title` when present   |
//! | `/shop[/{cat}[/{page:\d+}]]`| `/shop`, `/shop/a`, `/shop/a/2` | nested optional groups |
//!
//! Optional groups must close the pattern. Parameter values are
//! URL-decoded before they reach handlers.
//!
//! ## Route Files
//!
//! ```yaml
//! routes:
//!   - method: GET
//!     path: "/[{name}]"
//!     handler: welcome
//! groups:
//!   - prefix: /admin
//!     guards: [token_guard]
//!     routes:
//!       - { method: GET, path: /metrics, handler: metrics }
//!       - { method: POST, path: "/echo/{id:\\d+}", handler: echo }
//! ```
//!
//! ```bash
//! APP_ENV=development APP_GUARD_TOKEN=s3cret kickstart serve --routes routes.yaml
//! ```
//!
//! ## Concurrency
//!
//! The router, compiled patterns, registry and global middleware are
//! immutable after startup and shared through `Arc`. Chains and requests
//! are owned by the thread serving the request.

pub mod actions;
pub mod app;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod error_page;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod registry;
pub mod render;
pub mod router;
pub mod server;

pub use error::{DispatchError, Fault, RouteError};
