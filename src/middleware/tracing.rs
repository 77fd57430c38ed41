use std::time::Instant;

use tracing::{field, info_span};

use super::chain::Next;
use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Global middleware that wraps the rest of the chain in a `request` span.
///
/// Everything logged by guards and the action is recorded inside the span;
/// `status` and `latency_ms` are filled in once the chain returns.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn process(&self, req: &mut HandlerRequest, next: Next<'_>) -> anyhow::Result<HandlerResponse> {
        let span = info_span!(
            "request",
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            handler = field::Empty,
            status = field::Empty,
            latency_ms = field::Empty,
        );
        if let Some(route) = req.route() {
            span.record("handler", route.handler_id.as_ref());
        }

        let start = Instant::now();
        let result = span.in_scope(|| next.run(req));

        if let Ok(res) = &result {
            span.record("status", res.status);
        }
        span.record("latency_ms", start.elapsed().as_millis() as u64);
        result
    }
}
