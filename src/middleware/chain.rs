//! Per-request middleware chains.
//!
//! [`ChainBuilder`] turns a matched [`Route`] into a [`MiddlewareChain`]:
//!
//! ```text
//! [global_1, ..., global_k, guard_1, ..., guard_n, action]
//! ```
//!
//! Guard and action ids are resolved through a [`Resolver`] in declared
//! order. Construction is all-or-nothing: if any id is unknown the build
//! fails before a single element runs.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use super::core::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::DispatchError;
use crate::registry::Resolver;
use crate::router::Route;

/// Role of an element within a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Process-wide middleware, shared by every route
    Global,
    /// A route guard
    Guard,
    /// The terminal action
    Action,
}

struct ChainElement {
    id: Arc<str>,
    kind: ElementKind,
    handler: Arc<dyn Middleware>,
}

/// Continuation handed to each element; runs the rest of the chain.
pub struct Next<'a> {
    chain: &'a MiddlewareChain,
    index: usize,
}

impl Next<'_> {
    /// Invoke the next element of the chain.
    ///
    /// Called by the action, which has no successor, this logs a
    /// [`DispatchError::ChainMisuse`], marks the chain, and returns a
    /// placeholder `500`; the action's own return value is still what the
    /// chain produces.
    ///
    /// # Errors
    ///
    /// Whatever the next element returns.
    pub fn run(self, req: &mut HandlerRequest) -> anyhow::Result<HandlerResponse> {
        self.chain.run_from(self.index, req)
    }
}

/// Ordered, request-scoped list of handlers. Never cached or shared across
/// requests.
pub struct MiddlewareChain {
    elements: Vec<ChainElement>,
    misuse: Cell<bool>,
}

impl MiddlewareChain {
    /// Run the chain from its head.
    ///
    /// # Errors
    ///
    /// Any error returned by an element and not handled by an earlier one.
    pub fn execute(&self, req: &mut HandlerRequest) -> anyhow::Result<HandlerResponse> {
        self.run_from(0, req)
    }

    fn run_from(&self, index: usize, req: &mut HandlerRequest) -> anyhow::Result<HandlerResponse> {
        let Some(element) = self.elements.get(index) else {
            let action = self
                .elements
                .last()
                .map(|e| e.id.to_string())
                .unwrap_or_default();
            let misuse = DispatchError::ChainMisuse { id: action };
            error!(
                request_id = %req.request_id,
                path = %req.path,
                error = %misuse,
                "Chain misuse: action called next"
            );
            self.misuse.set(true);
            return Ok(HandlerResponse::error(500, "no next handler after the action"));
        };

        debug!(
            request_id = %req.request_id,
            element_idx = index,
            element_id = %element.id,
            element_kind = ?element.kind,
            "Chain element start"
        );

        element.handler.process(
            req,
            Next {
                chain: self,
                index: index + 1,
            },
        )
    }

    /// Number of elements including the action.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the chain is empty (never true for a built chain).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element ids in execution order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.elements.iter().map(|e| e.id.as_ref()).collect()
    }

    /// Element kinds in execution order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ElementKind> {
        self.elements.iter().map(|e| e.kind).collect()
    }

    /// Whether the action called `next` during execution.
    #[must_use]
    pub fn misuse_detected(&self) -> bool {
        self.misuse.get()
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("ids", &self.ids())
            .field("misuse", &self.misuse.get())
            .finish()
    }
}

/// Assembles chains from routes, global middleware and a resolver.
#[derive(Clone)]
pub struct ChainBuilder {
    resolver: Arc<dyn Resolver>,
    global: Vec<(Arc<str>, Arc<dyn Middleware>)>,
}

impl ChainBuilder {
    /// A builder with no global middleware.
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            global: Vec::new(),
        }
    }

    /// Append a global middleware; it runs before every route's guards, in
    /// the order added.
    ///
    /// The instance is shared by all requests and must not keep request data.
    #[must_use]
    pub fn with_global(mut self, id: &str, middleware: Arc<dyn Middleware>) -> Self {
        self.global.push((Arc::from(id), middleware));
        self
    }

    /// Ids of the global middleware, in order.
    #[must_use]
    pub fn global_ids(&self) -> Vec<&str> {
        self.global.iter().map(|(id, _)| id.as_ref()).collect()
    }

    /// Resolve every guard and the action of `route` into a fresh chain.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnresolvedHandler`] for the first unknown id. Nothing
    /// has executed when this is returned.
    pub fn build(&self, route: &Route) -> Result<MiddlewareChain, DispatchError> {
        let mut elements = Vec::with_capacity(self.global.len() + route.guard_ids.len() + 1);

        for (id, handler) in &self.global {
            elements.push(ChainElement {
                id: Arc::clone(id),
                kind: ElementKind::Global,
                handler: Arc::clone(handler),
            });
        }

        for guard_id in &route.guard_ids {
            let handler = self.resolver.resolve(guard_id)?;
            elements.push(ChainElement {
                id: Arc::clone(guard_id),
                kind: ElementKind::Guard,
                handler,
            });
        }

        let action = self.resolver.resolve(&route.handler_id)?;
        elements.push(ChainElement {
            id: Arc::clone(&route.handler_id),
            kind: ElementKind::Action,
            handler: action,
        });

        debug!(
            route_id = %route.id,
            chain_len = elements.len(),
            "Middleware chain built"
        );

        Ok(MiddlewareChain {
            elements,
            misuse: Cell::new(false),
        })
    }
}
