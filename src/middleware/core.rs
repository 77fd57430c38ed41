use std::sync::Arc;

use super::chain::Next;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// The single capability shared by global middleware, route guards and
/// actions.
///
/// A middleware may:
/// - call `next.run(req)` and return its response as-is or transformed,
/// - call `next.run(req)` for a side effect and return its own response,
/// - return a response without calling `next` at all, in which case nothing
///   after it in the chain runs.
///
/// An action is the last element; it must not call `next`.
pub trait Middleware: Send + Sync {
    /// Handle `req`, optionally delegating to the rest of the chain.
    ///
    /// # Errors
    ///
    /// Any error is an uncaught fault: the dispatcher turns it into a `500`.
    fn process(&self, req: &mut HandlerRequest, next: Next<'_>) -> anyhow::Result<HandlerResponse>;
}

/// Adapter turning a closure into a [`Middleware`].
pub struct FnMiddleware<F>(F);

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut HandlerRequest, Next<'_>) -> anyhow::Result<HandlerResponse> + Send + Sync,
{
    fn process(&self, req: &mut HandlerRequest, next: Next<'_>) -> anyhow::Result<HandlerResponse> {
        (self.0)(req, next)
    }
}

/// Adapter turning a closure into a terminal action that ignores `next`.
pub struct FnAction<F>(F);

impl<F> Middleware for FnAction<F>
where
    F: Fn(&mut HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync,
{
    fn process(&self, req: &mut HandlerRequest, _next: Next<'_>) -> anyhow::Result<HandlerResponse> {
        (self.0)(req)
    }
}

/// Wrap a `(req, next)` closure as a shareable middleware.
///
/// ```
/// use kickstart::middleware::middleware_fn;
///
/// let passthrough = middleware_fn(|req, next| next.run(req));
/// # let _ = passthrough;
/// ```
pub fn middleware_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(&mut HandlerRequest, Next<'_>) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
{
    Arc::new(FnMiddleware(f))
}

/// Wrap a `req` closure as a shareable action.
///
/// ```
/// use kickstart::dispatcher::HandlerResponse;
/// use kickstart::middleware::action_fn;
///
/// let hello = action_fn(|_req| Ok(HandlerResponse::text(200, "hello")));
/// # let _ = hello;
/// ```
pub fn action_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(&mut HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
{
    Arc::new(FnAction(f))
}
