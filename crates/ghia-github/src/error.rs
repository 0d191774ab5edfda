//! Error types for the GitHub client.

use thiserror::Error;

/// Result type alias for GitHub operations.
pub type Result<T> = std::result::Result<T, GitHubError>;

/// Errors that can occur talking to GitHub.
///
/// These are per-unit failures: callers report them for the issue or
/// repository at hand and carry on with the rest.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Transport or decoding failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// GitHub answered with a non-success status.
    #[error("GitHub returned {status} for {url}")]
    Status { status: u16, url: String },

    /// Token cannot be used as a header value.
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

impl GitHubError {
    /// Whether GitHub refused the request for lack of rate limit budget.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 403 | 429, .. })
    }

    /// Whether the target does not exist (or is hidden from this token).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Short machine-readable reason, when the failure has a known cause.
    #[must_use]
    pub const fn reason(&self) -> Option<&'static str> {
        if self.is_rate_limited() {
            Some("rate_limited")
        } else if self.is_not_found() {
            Some("not_found")
        } else {
            None
        }
    }
}
