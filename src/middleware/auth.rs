use tracing::{debug, warn};

use super::chain::Next;
use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Route guard comparing the `authorization` header with a fixed token.
///
/// A mismatch or a missing header short-circuits with `401`; nothing after
/// the guard runs.
pub struct TokenGuard {
    token: String,
}

impl TokenGuard {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Middleware for TokenGuard {
    fn process(&self, req: &mut HandlerRequest, next: Next<'_>) -> anyhow::Result<HandlerResponse> {
        match req.get_header("authorization") {
            Some(h) if h == self.token => {
                debug!(request_id = %req.request_id, "Token accepted");
                next.run(req)
            }
            provided => {
                warn!(
                    request_id = %req.request_id,
                    path = %req.path,
                    header_present = provided.is_some(),
                    "Token guard rejected request"
                );
                Ok(HandlerResponse::error(401, "Unauthorized"))
            }
        }
    }
}
