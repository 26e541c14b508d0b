//! Route groups: shared path prefix and middleware.

use std::sync::Arc;

use switchyard_http::Method;

use crate::error::RouteError;
use crate::handler::{Handler, Middleware, compose};
use crate::router::Router;

/// A set of routes sharing a path prefix and per-group middleware.
///
/// Group middleware wraps only routes registered through the group and
/// runs inside the router's global middleware. It is applied at
/// registration time, so middleware added after a route does not affect
/// that route.
pub struct Group<'r> {
    router: &'r mut Router,
    prefix: String,
    middlewares: Vec<Arc<dyn Middleware>>,
}

/// Normalize a group prefix: ensure one leading slash, strip trailing
/// slashes, collapse an all-slash prefix to `/`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        return String::from("/");
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Join a normalized group prefix and a relative path into a full
/// pattern.
fn join_paths(prefix: &str, relative: &str) -> String {
    if prefix == "/" {
        return match relative {
            "" => String::from("/"),
            r if r.starts_with('/') => r.to_string(),
            r => format!("/{r}"),
        };
    }
    match relative {
        "" => prefix.to_string(),
        "/" => format!("{prefix}/"),
        r if r.starts_with('/') => format!("{prefix}{r}"),
        r => format!("{prefix}/{r}"),
    }
}

impl<'r> Group<'r> {
    pub(crate) fn new(router: &'r mut Router, prefix: &str) -> Self {
        Self {
            router,
            prefix: normalize_prefix(prefix),
            middlewares: Vec::new(),
        }
    }

    /// The normalized prefix of this group.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Append a middleware applied to routes registered through this
    /// group from this point on.
    pub fn use_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Create a nested group. The child joins its prefix onto this one
    /// and inherits the middleware added so far.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        let joined = join_paths(&self.prefix, &normalize_prefix(prefix));
        Group {
            router: &mut *self.router,
            prefix: normalize_prefix(&joined),
            middlewares: self.middlewares.clone(),
        }
    }

    /// Register `handler` under this group's prefix, wrapped in the
    /// group's middleware.
    pub fn register(
        &mut self,
        method: Method,
        relative: &str,
        handler: impl Handler,
    ) -> Result<(), RouteError> {
        let pattern = join_paths(&self.prefix, relative);
        let wrapped = compose(&self.middlewares, Arc::new(handler));
        self.router.register_arc(method, &pattern, wrapped)
    }

    /// Register `handler` for every method in [`Method::FOR_ANY`].
    ///
    /// # Panics
    /// Panics if any registration fails.
    pub fn any(&mut self, relative: &str, handler: impl Handler) {
        let pattern = join_paths(&self.prefix, relative);
        let wrapped = compose(&self.middlewares, Arc::new(handler));
        for method in Method::FOR_ANY {
            if let Err(err) = self
                .router
                .register_arc(method, &pattern, Arc::clone(&wrapped))
            {
                panic!("{err}");
            }
        }
    }
}

macro_rules! group_shortcuts {
    ($(($fn_name:ident, $method:ident, $verb:literal)),+ $(,)?) => {
        impl Group<'_> {
            $(
                #[doc = concat!("Register `handler` for ", $verb, " requests on the group-relative `path`.")]
                ///
                /// # Panics
                /// Panics if registration fails; route setup errors are
                /// programming mistakes.
                pub fn $fn_name(&mut self, path: &str, handler: impl Handler) {
                    if let Err(err) = self.register(Method::$method, path, handler) {
                        panic!("{err}");
                    }
                }
            )+
        }
    };
}

group_shortcuts!(
    (get, Get, "GET"),
    (head, Head, "HEAD"),
    (post, Post, "POST"),
    (put, Put, "PUT"),
    (patch, Patch, "PATCH"),
    (delete, Delete, "DELETE"),
    (options, Options, "OPTIONS"),
    (trace, Trace, "TRACE"),
);
