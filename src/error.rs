//! Error taxonomy for route registration and request dispatch.
//!
//! Two families exist:
//!
//! - [`RouteError`] is raised while the route table is being built. It is
//!   fatal: an application with an invalid route must not start serving.
//! - [`DispatchError`] and [`Fault`] are raised per request. The dispatcher
//!   converts every one of them into a [`HandlerResponse`](crate::dispatcher::HandlerResponse),
//!   so none of them ever reaches the transport.

use std::path::PathBuf;

use thiserror::Error;

/// Startup-time routing errors.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The route declaration is structurally invalid (bad pattern, bad method,
    /// duplicate parameter name, parameter regex that does not compile).
    #[error("invalid route `{pattern}`: {reason}")]
    InvalidRoute {
        /// The offending pattern as declared
        pattern: String,
        /// Human readable explanation
        reason: String,
    },

    /// A route declaration file could not be read or parsed.
    #[error("failed to load routes from {}: {reason}", path.display())]
    Load {
        /// File that was being loaded
        path: PathBuf,
        /// Underlying I/O or parse error, rendered
        reason: String,
    },
}

impl RouteError {
    pub(crate) fn invalid(pattern: &str, reason: impl Into<String>) -> Self {
        RouteError::InvalidRoute {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Per-request errors raised while assembling or running a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The resolver does not know this guard or handler id.
    #[error("no handler registered for id `{id}`")]
    UnresolvedHandler {
        /// The id that failed to resolve
        id: String,
    },

    /// The terminal action invoked `next`, which does not exist.
    #[error("action `{id}` called next, but it is the last element of the chain")]
    ChainMisuse {
        /// The handler id of the misbehaving action
        id: String,
    },
}

/// An uncaught failure escaping a middleware or action while the chain runs.
#[derive(Debug)]
pub enum Fault {
    /// An error returned through `Err(...)`
    Error(anyhow::Error),
    /// A panic caught at the dispatcher boundary, with its payload rendered
    Panic(String),
}

impl Fault {
    /// Build a fault from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Fault::Panic(message)
    }

    /// Short, single-line description of the fault.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Fault::Error(e) => e.to_string(),
            Fault::Panic(msg) => format!("panic: {msg}"),
        }
    }

    /// The full cause chain, outermost first.
    #[must_use]
    pub fn chain(&self) -> Vec<String> {
        match self {
            Fault::Error(e) => e.chain().map(ToString::to_string).collect(),
            Fault::Panic(msg) => vec![msg.clone()],
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}
