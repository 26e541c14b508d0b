//! Minimal HTTP types for the switchyard router.
//!
//! This crate provides the method, request, and response types the router
//! dispatches on. It is transport-agnostic: requests are constructed by
//! whatever server front end feeds the router, and responses describe
//! status, headers, and body without committing to a wire format.
//!
//! # Example
//!
//! ```
//! use switchyard_http::{Method, Request, Response};
//!
//! let req = Request::new(Method::Get, "/users/42");
//! assert_eq!(req.path(), "/users/42");
//!
//! let resp = Response::text("hello");
//! assert_eq!(resp.status.as_u16(), 200);
//! ```

#![forbid(unsafe_code)]

mod method;
mod request;
mod response;

pub use method::{InvalidMethod, Method};
pub use request::{Body, Headers, Request};
pub use response::{Response, StatusCode};
