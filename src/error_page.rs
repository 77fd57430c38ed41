//! Turning uncaught faults into responses.
//!
//! In development the `500` body carries the full error chain and the
//! request/route context; in production it carries only the request id so
//! the failure can be found in the logs.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::json;

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::Fault;

/// Error presentation toggle, selected by `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Full diagnostic detail in responses
    Development,
    /// Opaque responses
    #[default]
    Production,
}

impl FromStr for ErrorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(ErrorMode::Production),
            "development" | "dev" | "local" => Ok(ErrorMode::Development),
            other => Err(format!(
                "unknown environment `{other}`, expected production or development"
            )),
        }
    }
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMode::Development => f.write_str("development"),
            ErrorMode::Production => f.write_str("production"),
        }
    }
}

/// Renders a fault that escaped the chain.
pub trait ErrorPresenter: Send + Sync {
    /// Build the response for `fault` raised while serving `req`.
    fn present(&self, fault: &Fault, req: &HandlerRequest) -> HandlerResponse;
}

/// Verbose presenter for local work.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevelopmentPresenter;

impl ErrorPresenter for DevelopmentPresenter {
    fn present(&self, fault: &Fault, req: &HandlerRequest) -> HandlerResponse {
        let route = req.route().map(|r| r.to_string());
        HandlerResponse::json(
            500,
            json!({
                "error": "Internal Server Error",
                "message": fault.message(),
                "causes": fault.chain(),
                "panic": matches!(fault, Fault::Panic(_)),
                "request_id": req.request_id.to_string(),
                "method": req.method.as_str(),
                "path": req.path,
                "route": route,
                "attributes": req.attributes(),
            }),
        )
    }
}

/// Opaque presenter for production.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductionPresenter;

impl ErrorPresenter for ProductionPresenter {
    fn present(&self, _fault: &Fault, req: &HandlerRequest) -> HandlerResponse {
        HandlerResponse::json(
            500,
            json!({
                "error": "Internal Server Error",
                "request_id": req.request_id.to_string(),
            }),
        )
    }
}

/// The presenter matching `mode`.
#[must_use]
pub fn presenter_for(mode: ErrorMode) -> Arc<dyn ErrorPresenter> {
    match mode {
        ErrorMode::Development => Arc::new(DevelopmentPresenter),
        ErrorMode::Production => Arc::new(ProductionPresenter),
    }
}
