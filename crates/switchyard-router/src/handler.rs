//! Handler and middleware traits.

use std::sync::Arc;

use switchyard_http::{Request, Response};

use crate::params::Params;

/// A request handler.
///
/// Implemented automatically for any `Fn(&mut Request, &Params) -> Response`
/// closure, so plain functions and captures both register directly:
///
/// ```
/// use switchyard_http::{Request, Response};
/// use switchyard_router::Params;
///
/// fn hello(_req: &mut Request, params: &Params) -> Response {
///     Response::text(format!("hello, {}", params.get("name").unwrap_or("world")))
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handle a request with its captured route parameters.
    fn call(&self, req: &mut Request, params: &Params) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&mut Request, &Params) -> Response + Send + Sync + 'static,
{
    fn call(&self, req: &mut Request, params: &Params) -> Response {
        self(req, params)
    }
}

/// A middleware wraps a handler, producing a new handler.
///
/// Middleware is applied at configuration time; the wrapped chain is built
/// once and reused for every request.
pub trait Middleware: Send + Sync + 'static {
    /// Wrap `next`, returning the outer handler.
    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler>;
}

impl<F> Middleware for F
where
    F: Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync + 'static,
{
    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        self(next)
    }
}

/// Apply `middlewares` to `handler` so the first middleware in the slice
/// runs outermost.
pub(crate) fn compose(
    middlewares: &[Arc<dyn Middleware>],
    handler: Arc<dyn Handler>,
) -> Arc<dyn Handler> {
    middlewares
        .iter()
        .rev()
        .fold(handler, |next, mw| mw.wrap(next))
}
