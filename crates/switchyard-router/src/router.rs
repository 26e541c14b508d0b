//! The router: per-method tries plus the dispatch decision logic.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use switchyard_http::{Method, Request, Response, StatusCode};

use crate::error::RouteError;
use crate::group::Group;
use crate::handler::{Handler, Middleware, compose};
use crate::params::{MATCHED_ROUTE_PATH_KEY, Params, ParamsPool};
use crate::path::clean_path;
use crate::tree::{Node, count_params};

/// Builds the response for an error status the router produced itself
/// (404, 405, and the 500 fallback after a panic).
pub type ErrorResponderFn = dyn Fn(&mut Request, StatusCode) -> Response + Send + Sync;

/// Handles a panic recovered at the dispatch boundary. The second argument
/// is the panic payload.
pub type RecoveryFn = dyn Fn(&mut Request, &(dyn Any + Send)) -> Response + Send + Sync;

/// Result of a manual route lookup.
pub struct Lookup {
    /// The matched handler, if any.
    pub handler: Option<Arc<dyn Handler>>,
    /// Parameters captured along the match.
    pub params: Params,
    /// True when no handler matched but the path with a toggled trailing
    /// slash would.
    pub tsr: bool,
}

/// HTTP request router.
///
/// Routes are registered per method against patterns that may contain
/// `:param` segments (matching one path segment) and a trailing
/// `*catchall` segment (matching the rest of the path). Registration is
/// not safe to run concurrently with serving; build all routes first,
/// then serve.
///
/// ```
/// use switchyard_http::{Method, Request, Response};
/// use switchyard_router::Router;
///
/// let mut router = Router::new();
/// router.get("/hello/:name", |_req: &mut Request, params: &switchyard_router::Params| {
///     Response::text(format!("hello, {}", params.get("name").unwrap_or("")))
/// });
///
/// let service = router.into_service();
/// let mut req = Request::new(Method::Get, "/hello/ferris");
/// let resp = service.serve(&mut req);
/// assert_eq!(resp.body, b"hello, ferris");
/// ```
pub struct Router {
    trees: [Option<Node>; Method::ALL.len()],
    pool: ParamsPool,
    max_params: usize,

    redirect_trailing_slash: bool,
    redirect_fixed_path: bool,
    handle_method_not_allowed: bool,
    handle_options: bool,
    save_matched_route_path: bool,

    global_allowed: String,

    not_found: Option<Arc<dyn Handler>>,
    method_not_allowed: Option<Arc<dyn Handler>>,
    global_options: Option<Arc<dyn Handler>>,
    recovery: Option<Arc<RecoveryFn>>,
    error_responder: Option<Arc<ErrorResponderFn>>,
    fallback: Option<Arc<dyn Handler>>,

    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a router with trailing-slash redirects, fixed-path
    /// redirects, automatic OPTIONS answers, and 405 handling enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trees: std::array::from_fn(|_| None),
            pool: ParamsPool::default(),
            max_params: 0,
            redirect_trailing_slash: true,
            redirect_fixed_path: true,
            handle_method_not_allowed: true,
            handle_options: true,
            save_matched_route_path: false,
            global_allowed: String::new(),
            not_found: None,
            method_not_allowed: None,
            global_options: None,
            recovery: None,
            error_responder: None,
            fallback: None,
            middlewares: Vec::new(),
        }
    }

    // --- configuration ---

    /// Redirect to the route with a toggled trailing slash when only that
    /// variant is registered. On by default.
    pub fn redirect_trailing_slash(&mut self, enabled: bool) -> &mut Self {
        self.redirect_trailing_slash = enabled;
        self
    }

    /// Redirect to the registered route after cleaning the path and
    /// folding ASCII case when that finds a unique match. On by default.
    pub fn redirect_fixed_path(&mut self, enabled: bool) -> &mut Self {
        self.redirect_fixed_path = enabled;
        self
    }

    /// Answer unmatched methods with 405 and an `Allow` header instead of
    /// 404. On by default.
    pub fn handle_method_not_allowed(&mut self, enabled: bool) -> &mut Self {
        self.handle_method_not_allowed = enabled;
        self
    }

    /// Answer OPTIONS requests automatically with an `Allow` header. On by
    /// default.
    pub fn handle_options(&mut self, enabled: bool) -> &mut Self {
        self.handle_options = enabled;
        self.global_allowed = self.compute_global_allowed();
        self
    }

    /// Record the matched route pattern under
    /// [`MATCHED_ROUTE_PATH_KEY`] in the handler's parameters. Off by
    /// default.
    pub fn save_matched_route_path(&mut self, enabled: bool) -> &mut Self {
        self.save_matched_route_path = enabled;
        self
    }

    /// Handler invoked when no route and no fallback produced a response.
    pub fn not_found(&mut self, handler: impl Handler) -> &mut Self {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// Handler invoked for 405 responses instead of the default one.
    pub fn method_not_allowed(&mut self, handler: impl Handler) -> &mut Self {
        self.method_not_allowed = Some(Arc::new(handler));
        self
    }

    /// Handler invoked for automatic OPTIONS answers instead of an empty
    /// 200.
    pub fn global_options(&mut self, handler: impl Handler) -> &mut Self {
        self.global_options = Some(Arc::new(handler));
        self
    }

    /// Responder for panics recovered at the dispatch boundary. Without
    /// one, a panic turns into the error responder's 500.
    pub fn recovery(
        &mut self,
        f: impl Fn(&mut Request, &(dyn Any + Send)) -> Response + Send + Sync + 'static,
    ) -> &mut Self {
        self.recovery = Some(Arc::new(f));
        self
    }

    /// Responder used for router-generated error statuses (404, 405, 500).
    /// When set, it also intercepts error statuses returned by the
    /// [`fallback`](Self::fallback) handler.
    pub fn error_responder(
        &mut self,
        f: impl Fn(&mut Request, StatusCode) -> Response + Send + Sync + 'static,
    ) -> &mut Self {
        self.error_responder = Some(Arc::new(f));
        self
    }

    /// Handler tried when no route matched at all, before `not_found`.
    /// Typically a static-file server.
    pub fn fallback(&mut self, handler: impl Handler) -> &mut Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    /// Append a global middleware. Middleware runs outermost-first in
    /// registration order, around the entire dispatch including redirects
    /// and error responses.
    pub fn use_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    // --- registration ---

    /// Register `handler` for `method` and `pattern`.
    ///
    /// On error the router is unchanged: the route is inserted into a
    /// copy of the method tree which is committed only on success.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<(), RouteError> {
        self.register_arc(method, pattern, Arc::new(handler))
    }

    /// [`register`](Self::register) for an already shared handler, used
    /// when one handler serves several routes.
    pub fn register_arc(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        if !pattern.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            });
        }

        let idx = method.index();
        let created = self.trees[idx].is_none();

        let mut staged = match &self.trees[idx] {
            Some(tree) => tree.clone(),
            None => Node::new(),
        };
        staged.add_route(pattern, handler)?;
        self.trees[idx] = Some(staged);

        if created {
            self.global_allowed = self.compute_global_allowed();
        }

        self.max_params = self.max_params.max(count_params(pattern));
        tracing::debug!(method = %method, pattern, "route registered");
        Ok(())
    }

    /// Register `handler` for every method in [`Method::FOR_ANY`].
    ///
    /// # Panics
    /// Panics if any registration fails.
    pub fn any(&mut self, pattern: &str, handler: impl Handler) {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        for method in Method::FOR_ANY {
            if let Err(err) = self.register_arc(method, pattern, Arc::clone(&handler)) {
                panic!("{err}");
            }
        }
    }

    /// Create a [`Group`] whose routes share `prefix` and its middleware.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        Group::new(self, prefix)
    }

    // --- lookup and dispatch ---

    /// Manually look up `method` + `path` without dispatching.
    #[must_use]
    pub fn lookup(&self, method: Method, path: &str) -> Lookup {
        let Some(root) = &self.trees[method.index()] else {
            return Lookup {
                handler: None,
                params: Params::new(),
                tsr: false,
            };
        };
        let mut params = self.pool.acquire(self.reserve_params());
        let found = root.get_value(path, &mut params);
        Lookup {
            handler: found.handler,
            params,
            tsr: found.tsr,
        }
    }

    /// Consume the router and build the serving front end, composing the
    /// global middleware chain around dispatch.
    #[must_use]
    pub fn into_service(self) -> RouterService {
        let router = Arc::new(self);
        let inner: Arc<dyn Handler> = Arc::new(Dispatch {
            router: Arc::clone(&router),
        });
        let entry = compose(&router.middlewares, inner);
        RouterService { router, entry }
    }

    fn reserve_params(&self) -> usize {
        self.max_params + usize::from(self.save_matched_route_path)
    }

    /// Full decision logic behind the middleware chain, with panic
    /// recovery at its boundary.
    fn dispatch(&self, req: &mut Request) -> Response {
        match panic::catch_unwind(AssertUnwindSafe(|| self.route(req))) {
            Ok(resp) => resp,
            Err(payload) => {
                tracing::error!(path = %req.path(), "handler panicked");
                match &self.recovery {
                    Some(recovery) => recovery(req, payload.as_ref()),
                    None => self.error_response(req, StatusCode::INTERNAL_SERVER_ERROR),
                }
            }
        }
    }

    fn route(&self, req: &mut Request) -> Response {
        let method = req.method();
        // captures copy their segments, so the path borrow ends before any
        // handler takes the request mutably
        let path = req.path();

        if let Some(root) = &self.trees[method.index()] {
            let mut params = self.pool.acquire(self.reserve_params());
            let found = root.get_value(path, &mut params);

            if let Some(handler) = found.handler {
                if self.save_matched_route_path {
                    if let Some(pattern) = &found.pattern {
                        params.push(MATCHED_ROUTE_PATH_KEY, pattern.as_ref());
                    }
                }
                return handler.call(req, &params);
            }
            drop(params);

            if method != Method::Connect && path != "/" {
                let code = if matches!(method, Method::Get | Method::Head) {
                    StatusCode::MOVED_PERMANENTLY
                } else {
                    StatusCode::PERMANENT_REDIRECT
                };

                if found.tsr && self.redirect_trailing_slash {
                    let target = if path.len() > 1 && path.ends_with('/') {
                        path[..path.len() - 1].to_string()
                    } else {
                        format!("{path}/")
                    };
                    return Response::redirect(code, with_query(target, req.query()));
                }

                if self.redirect_fixed_path {
                    if let Some(fixed) = root
                        .find_case_insensitive(&clean_path(path), self.redirect_trailing_slash)
                    {
                        return Response::redirect(code, with_query(fixed, req.query()));
                    }
                }
            }
        }

        if method == Method::Options && self.handle_options {
            let allow = self.allowed(path, Some(Method::Options));
            if !allow.is_empty() {
                if let Some(handler) = &self.global_options {
                    let mut resp = handler.call(req, &Params::new());
                    if !resp.headers.contains("allow") {
                        resp.headers.insert("allow", allow);
                    }
                    return resp;
                }
                return Response::new(StatusCode::OK).with_header("allow", allow);
            }
        } else if self.handle_method_not_allowed {
            let allow = self.allowed(path, Some(method));
            if !allow.is_empty() {
                if let Some(handler) = &self.method_not_allowed {
                    let mut resp = handler.call(req, &Params::new());
                    if !resp.headers.contains("allow") {
                        resp.headers.insert("allow", allow);
                    }
                    return resp;
                }
                let mut resp = self.error_response(req, StatusCode::METHOD_NOT_ALLOWED);
                resp.headers.insert("allow", allow);
                return resp;
            }
        }

        if let Some(fallback) = &self.fallback {
            let mut resp = fallback.call(req, &Params::new());
            if resp.status.is_client_error() || resp.status.is_server_error() {
                if let Some(responder) = &self.error_responder {
                    resp = responder(req, resp.status);
                }
            }
            return resp;
        }

        if let Some(handler) = &self.not_found {
            return handler.call(req, &Params::new());
        }
        self.error_response(req, StatusCode::NOT_FOUND)
    }

    fn error_response(&self, req: &mut Request, status: StatusCode) -> Response {
        match &self.error_responder {
            Some(responder) => responder(req, status),
            None => Response::status_text(status),
        }
    }

    /// Methods allowed for `path`, formatted for an `Allow` header.
    /// `path == "*"` answers for the whole server from the cached set.
    fn allowed(&self, path: &str, req_method: Option<Method>) -> String {
        let mut methods: Vec<&'static str> = Vec::with_capacity(Method::ALL.len());

        if path == "*" {
            if req_method.is_some() {
                return self.global_allowed.clone();
            }
            for method in Method::ALL {
                if method == Method::Options {
                    continue;
                }
                if self.trees[method.index()].is_some() {
                    methods.push(method.as_str());
                }
            }
        } else {
            for method in Method::ALL {
                if Some(method) == req_method || method == Method::Options {
                    continue;
                }
                if let Some(root) = &self.trees[method.index()] {
                    let mut probe = Params::new();
                    if root.get_value(path, &mut probe).handler.is_some() {
                        methods.push(method.as_str());
                    }
                }
            }
        }

        if methods.is_empty() {
            return String::new();
        }
        if self.handle_options {
            methods.push(Method::Options.as_str());
        }
        methods.sort_unstable();
        methods.join(", ")
    }

    /// Cached value served for OPTIONS on `*`, recomputed whenever a new
    /// method tree appears.
    fn compute_global_allowed(&self) -> String {
        self.allowed("*", None)
    }
}

fn with_query(target: String, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{target}?{q}"),
        _ => target,
    }
}

macro_rules! method_shortcuts {
    ($(($fn_name:ident, $method:ident, $verb:literal)),+ $(,)?) => {
        impl Router {
            $(
                #[doc = concat!("Register `handler` for ", $verb, " requests on `pattern`.")]
                ///
                /// # Panics
                /// Panics if registration fails; route setup errors are
                /// programming mistakes.
                pub fn $fn_name(&mut self, pattern: &str, handler: impl Handler) {
                    if let Err(err) = self.register(Method::$method, pattern, handler) {
                        panic!("{err}");
                    }
                }
            )+
        }
    };
}

method_shortcuts!(
    (get, Get, "GET"),
    (head, Head, "HEAD"),
    (post, Post, "POST"),
    (put, Put, "PUT"),
    (patch, Patch, "PATCH"),
    (delete, Delete, "DELETE"),
    (options, Options, "OPTIONS"),
    (trace, Trace, "TRACE"),
);

/// The innermost handler of the global middleware chain.
struct Dispatch {
    router: Arc<Router>,
}

impl Handler for Dispatch {
    fn call(&self, req: &mut Request, _params: &Params) -> Response {
        self.router.dispatch(req)
    }
}

/// A built router behind its middleware chain, ready to serve requests
/// concurrently.
#[derive(Clone)]
pub struct RouterService {
    router: Arc<Router>,
    entry: Arc<dyn Handler>,
}

impl RouterService {
    /// Serve one request through the middleware chain and dispatch.
    pub fn serve(&self, req: &mut Request) -> Response {
        self.entry.call(req, &Params::new())
    }

    /// Access the routing table, e.g. for manual lookups.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl Handler for RouterService {
    fn call(&self, req: &mut Request, _params: &Params) -> Response {
        self.serve(req)
    }
}
