//! Error types for ghia-core.

use thiserror::Error;

/// Result type alias for ghia-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in ghia-core operations.
///
/// Matching and resolution never fail once a [`crate::RuleSet`] exists, so every
/// variant here is either a configuration problem caught at compile time or a
/// rejected webhook.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed INI text.
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A required section is absent.
    #[error("missing section [{0}]")]
    MissingSection(String),

    /// A required key is absent from a section.
    #[error("missing key '{key}' in section [{section}]")]
    MissingKey { section: String, key: String },

    /// A key holds a value that cannot be interpreted.
    #[error("invalid value for '{key}' in section [{section}]: {value}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    /// A rule names a field other than title, text, label or any.
    #[error("unknown field '{field}' for assignee '{assignee}' on line {line}")]
    UnknownField {
        assignee: String,
        field: String,
        line: usize,
    },

    /// A rule line has no `field:pattern` separator.
    #[error("malformed rule '{entry}' for assignee '{assignee}' on line {line}")]
    MalformedRule {
        assignee: String,
        entry: String,
        line: usize,
    },

    /// A rule pattern failed to compile.
    #[error("invalid pattern for assignee '{assignee}' on line {line}: {source}")]
    InvalidPattern {
        assignee: String,
        line: usize,
        #[source]
        source: regex::Error,
    },

    /// An assignee key appears twice in `[patterns]`.
    #[error("duplicate assignee '{assignee}' on line {line}")]
    DuplicateAssignee { assignee: String, line: usize },

    /// Reposlug not in owner/repository format.
    #[error("invalid reposlug '{0}': not in owner/repository format")]
    InvalidReposlug(String),

    /// Webhook carried no signature although a secret is configured.
    #[error("webhook signature missing")]
    MissingSignature,

    /// Webhook signature does not match the payload.
    #[error("webhook signature mismatch")]
    SignatureMismatch,

    /// Webhook signature uses a digest other than sha1 or sha256.
    #[error("unsupported signature digest '{0}'")]
    UnsupportedDigest(String),
}

impl CoreError {
    /// Whether this error belongs to the configuration class.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        !self.is_auth()
    }

    /// Whether this error rejects a single webhook request.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::MissingSignature | Self::SignatureMismatch | Self::UnsupportedDigest(_)
        )
    }
}
