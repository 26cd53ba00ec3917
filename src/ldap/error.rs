//! Failures of a directory verification attempt.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Underlying cause kept for operator logs.
pub type Cause = Box<dyn std::error::Error + Send + Sync>;

/// Stage at which a verification attempt stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    Connection,
    ServiceBind,
    Search,
    NoUniqueMatch,
    UserBind,
}

impl Reason {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Connection => "connection_error",
            Reason::ServiceBind => "service_bind_error",
            Reason::Search => "search_error",
            Reason::NoUniqueMatch => "no_unique_match",
            Reason::UserBind => "user_bind_error",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enum representing every way a verification can fail.
///
/// Messages are meant for operators only. Callers facing end users must
/// collapse every variant into the same opaque answer.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("cannot connect to directory: {0}")]
    Connection(#[source] Cause),

    #[error("service account bind rejected: {0}")]
    ServiceBind(#[source] Cause),

    #[error("directory search failed: {0}")]
    Search(#[source] Cause),

    #[error("{count} entries matched the login name, exactly one expected")]
    NoUniqueMatch { count: usize },

    #[error("user bind rejected: {0}")]
    UserBind(#[source] Cause),
}

impl AuthError {
    /// Stage tag of this failure.
    pub fn reason(&self) -> Reason {
        match self {
            AuthError::Connection(_) => Reason::Connection,
            AuthError::ServiceBind(_) => Reason::ServiceBind,
            AuthError::Search(_) => Reason::Search,
            AuthError::NoUniqueMatch { .. } => Reason::NoUniqueMatch,
            AuthError::UserBind(_) => Reason::UserBind,
        }
    }
}

/// A simple bind with an empty password is an unauthenticated bind
/// (RFC 4513 §5.1.2), which most servers answer with success.
#[derive(Debug, Error)]
#[error("empty password refused, it would perform an unauthenticated bind")]
pub struct EmptyPassword;
