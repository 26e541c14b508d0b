//! Registration errors.

use std::fmt;

/// Error raised when a route pattern cannot be registered.
///
/// All variants indicate a programming mistake in route setup. The tree is
/// left untouched when registration fails, so a caller that chooses to
/// ignore the error keeps a consistent router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Pattern does not begin with `/`.
    MissingLeadingSlash {
        /// The offending pattern.
        pattern: String,
    },
    /// A handler is already registered for this exact pattern.
    DuplicateRoute {
        /// The pattern registered twice.
        pattern: String,
    },
    /// A wildcard segment collides with a different wildcard already in
    /// the tree at the same position, or with existing static children.
    WildcardConflict {
        /// The pattern being inserted.
        pattern: String,
        /// The wildcard segment from the new pattern.
        segment: String,
        /// The conflicting prefix already present in the tree.
        existing: String,
    },
    /// A path segment contains more than one `:` or `*` marker.
    MultipleWildcards {
        /// The pattern being inserted.
        pattern: String,
        /// The segment holding multiple wildcards.
        segment: String,
    },
    /// A `:` or `*` marker is not followed by a name.
    UnnamedWildcard {
        /// The pattern being inserted.
        pattern: String,
    },
    /// A catch-all segment is followed by further path bytes.
    CatchAllNotLast {
        /// The pattern being inserted.
        pattern: String,
    },
    /// A catch-all would shadow handlers already registered for the
    /// segment root it attaches to.
    CatchAllRootConflict {
        /// The pattern being inserted.
        pattern: String,
    },
    /// A catch-all is not preceded by `/`.
    CatchAllNoSlash {
        /// The pattern being inserted.
        pattern: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLeadingSlash { pattern } => {
                write!(f, "pattern must begin with '/': '{pattern}'")
            }
            Self::DuplicateRoute { pattern } => {
                write!(f, "a handler is already registered for path '{pattern}'")
            }
            Self::WildcardConflict {
                pattern,
                segment,
                existing,
            } => write!(
                f,
                "'{segment}' in new path '{pattern}' conflicts with existing wildcard segment in prefix '{existing}'"
            ),
            Self::MultipleWildcards { pattern, segment } => write!(
                f,
                "only one wildcard per path segment is allowed, has '{segment}' in path '{pattern}'"
            ),
            Self::UnnamedWildcard { pattern } => write!(
                f,
                "wildcards must be named with a non-empty name in path '{pattern}'"
            ),
            Self::CatchAllNotLast { pattern } => write!(
                f,
                "catch-all routes are only allowed at the end of the path in path '{pattern}'"
            ),
            Self::CatchAllRootConflict { pattern } => write!(
                f,
                "catch-all conflicts with existing handle for the path segment root in path '{pattern}'"
            ),
            Self::CatchAllNoSlash { pattern } => {
                write!(f, "no '/' before catch-all in path '{pattern}'")
            }
        }
    }
}

impl std::error::Error for RouteError {}
