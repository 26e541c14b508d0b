//! HTTP request methods.

use std::fmt;
use std::str::FromStr;

/// An HTTP request method.
///
/// The router keeps one independent route tree per method, so the set of
/// methods is closed: anything outside this list is rejected at the parsing
/// boundary rather than silently routed nowhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Trace,
    Connect,
}

impl Method {
    /// Every method the router can hold a tree for.
    pub const ALL: [Method; 9] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
        Method::Options,
        Method::Trace,
        Method::Connect,
    ];

    /// The methods registered by a catch-all-methods registration.
    ///
    /// TRACE and CONNECT are deliberately excluded; they are almost never
    /// served by application handlers.
    pub const FOR_ANY: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
    ];

    /// The canonical upper-case token for this method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Connect => "CONNECT",
        }
    }

    /// A dense index in `0..Method::ALL.len()`, stable across the enum.
    ///
    /// Used to key per-method storage without hashing.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown method token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMethod {
    token: String,
}

impl InvalidMethod {
    /// The token that failed to parse.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Display for InvalidMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid HTTP method '{}'", self.token)
    }
}

impl std::error::Error for InvalidMethod {}

impl FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "OPTIONS" => Ok(Method::Options),
            "TRACE" => Ok(Method::Trace),
            "CONNECT" => Ok(Method::Connect),
            _ => Err(InvalidMethod { token: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_all_methods() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>(), Ok(method));
        }
    }

    #[test]
    fn rejects_unknown_and_lowercase_tokens() {
        assert!("BREW".parse::<Method>().is_err());
        assert!("get".parse::<Method>().is_err());
    }

    #[test]
    fn indices_are_dense_and_unique() {
        let mut seen = [false; Method::ALL.len()];
        for method in Method::ALL {
            assert!(!seen[method.index()]);
            seen[method.index()] = true;
        }
    }

    #[test]
    fn any_set_skips_trace_and_connect() {
        assert!(!Method::FOR_ANY.contains(&Method::Trace));
        assert!(!Method::FOR_ANY.contains(&Method::Connect));
    }
}
