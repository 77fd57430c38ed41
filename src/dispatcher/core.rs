use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::request::HandlerRequest;
use super::response::HandlerResponse;
use crate::error::Fault;
use crate::error_page::{presenter_for, ErrorMode, ErrorPresenter};
use crate::middleware::ChainBuilder;
use crate::router::{MatchResult, Router};

/// Turns every inbound request into exactly one response.
///
/// Per request: Routing → ChainBuilding → Executing → Completed. A miss in
/// routing ends with `404` or `405`; an unknown guard or action id ends with
/// `500` before anything runs; an error or panic from the chain is handed to
/// the [`ErrorPresenter`]. Nothing is retried and nothing escapes to the
/// transport.
///
/// The dispatcher holds only immutable, `Arc`-shared state and can serve
/// concurrent requests from many threads.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    chains: ChainBuilder,
    presenter: Arc<dyn ErrorPresenter>,
}

impl Dispatcher {
    /// A dispatcher presenting faults according to `mode`.
    pub fn new(router: Arc<Router>, chains: ChainBuilder, mode: ErrorMode) -> Self {
        Self::with_presenter(router, chains, presenter_for(mode))
    }

    /// A dispatcher with a custom presenter.
    pub fn with_presenter(
        router: Arc<Router>,
        chains: ChainBuilder,
        presenter: Arc<dyn ErrorPresenter>,
    ) -> Self {
        Self {
            router,
            chains,
            presenter,
        }
    }

    /// The router this dispatcher matches against.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Route, build the chain, run it, and return the response.
    pub fn dispatch(&self, mut req: HandlerRequest) -> HandlerResponse {
        let start = Instant::now();
        let request_id = req.request_id;

        // D1: Routing
        let route_match = match self.router.route(&req.method, &req.path) {
            MatchResult::Matched(m) => m,
            MatchResult::NotFound => {
                info!(
                    request_id = %request_id,
                    method = %req.method,
                    path = %req.path,
                    status = 404,
                    "No route matched"
                );
                return HandlerResponse::error(404, "Not Found");
            }
            MatchResult::MethodNotAllowed { allowed } => {
                let allow = MatchResult::allow_header(&allowed);
                info!(
                    request_id = %request_id,
                    method = %req.method,
                    path = %req.path,
                    allow = %allow,
                    status = 405,
                    "Method not allowed"
                );
                return HandlerResponse::error(405, "Method Not Allowed").with_header("allow", allow);
            }
        };

        let route = Arc::clone(&route_match.route);
        req.set_route(Arc::clone(&route));

        // D2: Chain building
        let chain = match self.chains.build(&route) {
            Ok(chain) => chain,
            Err(e) => {
                error!(
                    request_id = %request_id,
                    route_id = %route.id,
                    route = %route,
                    error = %e,
                    "Chain construction failed - CRITICAL"
                );
                let fault = Fault::Error(anyhow::Error::new(e));
                return self.presenter.present(&fault, &req);
            }
        };

        // D3: Executing
        req.set_path_params(route_match.path_params);

        debug!(
            request_id = %request_id,
            handler_id = %route.handler_id,
            chain = ?chain.ids(),
            "Executing chain"
        );

        let outcome = catch_unwind(AssertUnwindSafe(|| chain.execute(&mut req)));

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                let fault = Fault::Error(err);
                error!(
                    request_id = %request_id,
                    handler_id = %route.handler_id,
                    error = ?fault.chain(),
                    "Unhandled error in chain"
                );
                self.presenter.present(&fault, &req)
            }
            Err(payload) => {
                let fault = Fault::from_panic(payload);
                error!(
                    request_id = %request_id,
                    handler_id = %route.handler_id,
                    panic_message = %fault.message(),
                    "Chain element panicked - CRITICAL"
                );
                self.presenter.present(&fault, &req)
            }
        };

        if chain.misuse_detected() {
            warn!(
                request_id = %request_id,
                handler_id = %route.handler_id,
                "Action called next; its own response was used"
            );
        }

        // D4: Completed
        info!(
            request_id = %request_id,
            method = %req.method,
            path = %req.path,
            handler_id = %route.handler_id,
            status = response.status,
            latency_us = start.elapsed().as_micros() as u64,
            "Request completed"
        );

        response
    }
}
