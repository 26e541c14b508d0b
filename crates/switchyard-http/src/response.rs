//! HTTP response types.

use crate::request::Headers;

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// 200 OK
    pub const OK: Self = Self(200);
    /// 201 Created
    pub const CREATED: Self = Self(201);
    /// 204 No Content
    pub const NO_CONTENT: Self = Self(204);
    /// 301 Moved Permanently
    pub const MOVED_PERMANENTLY: Self = Self(301);
    /// 308 Permanent Redirect
    pub const PERMANENT_REDIRECT: Self = Self(308);
    /// 400 Bad Request
    pub const BAD_REQUEST: Self = Self(400);
    /// 404 Not Found
    pub const NOT_FOUND: Self = Self(404);
    /// 405 Method Not Allowed
    pub const METHOD_NOT_ALLOWED: Self = Self(405);
    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// Get the numeric code.
    #[must_use]
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true for 3xx codes.
    #[must_use]
    pub fn is_redirection(self) -> bool {
        (300..400).contains(&self.0)
    }

    /// Returns true for 2xx codes.
    #[must_use]
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Returns true for 4xx codes.
    #[must_use]
    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.0)
    }

    /// Returns true for 5xx codes.
    #[must_use]
    pub fn is_server_error(self) -> bool {
        (500..600).contains(&self.0)
    }

    /// Get the canonical reason phrase for this status code, if known.
    #[must_use]
    pub fn canonical_reason(self) -> Option<&'static str> {
        match self.0 {
            200 => Some("OK"),
            201 => Some("Created"),
            204 => Some("No Content"),
            301 => Some("Moved Permanently"),
            308 => Some("Permanent Redirect"),
            400 => Some("Bad Request"),
            404 => Some("Not Found"),
            405 => Some("Method Not Allowed"),
            500 => Some("Internal Server Error"),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.canonical_reason() {
            Some(reason) => write!(f, "{} {reason}", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// HTTP response.
#[derive(Debug)]
pub struct Response {
    /// Response status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: Headers,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// Create a response with the given status and empty body.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Create a 200 response with a plain text body.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        let body = body.into().into_bytes();
        let mut headers = Headers::new();
        headers.insert("content-type", "text/plain; charset=utf-8");
        Self {
            status: StatusCode::OK,
            headers,
            body,
        }
    }

    /// Create a response with a status and the status's reason phrase as
    /// text body, matching the default error pages servers emit.
    #[must_use]
    pub fn status_text(status: StatusCode) -> Self {
        let mut resp = Self::new(status);
        if let Some(reason) = status.canonical_reason() {
            resp.headers
                .insert("content-type", "text/plain; charset=utf-8");
            resp.body = reason.as_bytes().to_vec();
        }
        resp
    }

    /// Create a redirect response with a `Location` header.
    #[must_use]
    pub fn redirect(status: StatusCode, location: impl Into<String>) -> Self {
        let mut resp = Self::new(status);
        resp.headers.insert("location", location.into());
        resp
    }

    /// Set a header, builder style.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the body, builder style.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}
