//! Radix-trie HTTP request router.
//!
//! One trie per HTTP method stores the registered patterns. Patterns mix
//! static segments with `:param` captures (one segment) and a trailing
//! `*catchall` capture (the rest of the path, including its leading
//! slash). Lookup walks byte prefixes without allocating; captured
//! parameter buffers are recycled through a pool.
//!
//! Dispatch turns a lookup outcome into an action: invoke the handler,
//! redirect when only the trailing-slash or case/clean variant of the
//! path is registered, answer OPTIONS automatically, reply 405 with an
//! `Allow` header, or fall through to a configurable not-found chain.
//! Panics in handlers are recovered at the dispatch boundary.
//!
//! # Example
//!
//! ```
//! use switchyard_http::{Method, Request, Response};
//! use switchyard_router::{Params, Router};
//!
//! let mut router = Router::new();
//! router.get("/", |_: &mut Request, _: &Params| Response::text("index"));
//! router.get("/users/:id", |_: &mut Request, params: &Params| {
//!     Response::text(format!("user {}", params.get("id").unwrap_or("")))
//! });
//!
//! let service = router.into_service();
//! let mut req = Request::new(Method::Get, "/users/7");
//! assert_eq!(service.serve(&mut req).body, b"user 7");
//! ```

#![forbid(unsafe_code)]

mod error;
mod group;
mod handler;
mod params;
mod path;
mod router;
mod tree;

pub use error::RouteError;
pub use group::Group;
pub use handler::{Handler, Middleware};
pub use params::{MATCHED_ROUTE_PATH_KEY, Param, Params};
pub use path::clean_path;
pub use router::{ErrorResponderFn, Lookup, RecoveryFn, Router, RouterService};
