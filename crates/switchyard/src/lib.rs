//! Radix-trie HTTP request router.
//!
//! switchyard routes HTTP requests by method and path:
//!
//! - **Radix trie per method**: static segments, `:param` captures, and
//!   trailing `*catchall` captures, matched without allocation
//! - **Deterministic recovery**: trailing-slash redirects, path cleaning,
//!   and ASCII case-insensitive correction before giving up on a path
//! - **Method negotiation**: automatic OPTIONS answers and 405 responses
//!   carrying an `Allow` header
//! - **Hooks and middleware**: not-found, method-not-allowed, panic
//!   recovery, error responders, and an onion-style middleware chain
//!
//! # Quick Start
//!
//! ```
//! use switchyard::prelude::*;
//!
//! let mut router = Router::new();
//! router.get("/users/:id", |_req: &mut Request, params: &Params| {
//!     Response::text(format!("user {}", params.get("id").unwrap_or("")))
//! });
//!
//! let service = router.into_service();
//! let mut req = Request::new(Method::Get, "/users/42");
//! assert_eq!(service.serve(&mut req).body, b"user 42");
//! ```
//!
//! # Crate Structure
//!
//! - [`switchyard_http`]: method, request, and response types
//! - [`switchyard_router`]: the trie, lookup, and dispatch logic

#![forbid(unsafe_code)]

// Re-export crates
pub use switchyard_http as http;
pub use switchyard_router as router;

// Common types at the root
pub use switchyard_http::{Body, Headers, Method, Request, Response, StatusCode};
pub use switchyard_router::{
    Group, Handler, Lookup, MATCHED_ROUTE_PATH_KEY, Middleware, Param, Params, RouteError, Router,
    RouterService, clean_path,
};

/// Convenience imports for building and serving routes.
pub mod prelude {
    pub use crate::{
        Group, Handler, Method, Middleware, Params, Request, Response, RouteError, Router,
        RouterService, StatusCode,
    };
}
