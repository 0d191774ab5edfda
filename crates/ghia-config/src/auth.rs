//! Credentials from the `[github]` section.

use ghia_core::CoreError;
use ghia_core::ini::Document;
use std::fmt;

pub const GITHUB_SECTION: &str = "github";
const TOKEN_KEY: &str = "token";
const SECRET_KEY: &str = "secret";

/// API token and optional webhook secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub token: String,
    pub secret: Option<String>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: None,
        }
    }

    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Read the `[github]` section of a parsed document.
    ///
    /// An empty `secret` counts as no secret.
    ///
    /// # Errors
    /// Returns [`CoreError::MissingSection`] or [`CoreError::MissingKey`] when
    /// the section or a non-empty token is absent.
    pub fn from_document(doc: &Document) -> Result<Self, CoreError> {
        let section = doc
            .section(GITHUB_SECTION)
            .ok_or_else(|| CoreError::MissingSection(GITHUB_SECTION.to_string()))?;

        let token = section
            .get(TOKEN_KEY)
            .map(|e| e.value().trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CoreError::MissingKey {
                section: GITHUB_SECTION.to_string(),
                key: TOKEN_KEY.to_string(),
            })?;

        let secret = section
            .get(SECRET_KEY)
            .map(|e| e.value().trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self { token, secret })
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &"<redacted>")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<AuthConfig, CoreError> {
        AuthConfig::from_document(&Document::parse(text).unwrap())
    }

    #[test]
    fn test_token_and_secret() {
        let auth = parse("[github]\ntoken=abc123\nsecret=tajneheslo\n").unwrap();
        assert_eq!(auth, AuthConfig::new("abc123").with_secret("tajneheslo"));
    }

    #[test]
    fn test_secret_optional() {
        let auth = parse("[github]\ntoken=abc123\n").unwrap();
        assert!(auth.secret.is_none());

        let auth = parse("[github]\ntoken=abc123\nsecret=\n").unwrap();
        assert!(auth.secret.is_none());
    }

    #[test]
    fn test_missing_token() {
        assert!(matches!(
            parse("[github]\nsecret=x\n"),
            Err(CoreError::MissingKey { .. })
        ));
        assert!(matches!(
            parse("[githu]\ntoken=x\n"),
            Err(CoreError::MissingSection(_))
        ));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let auth = AuthConfig::new("abc123").with_secret("tajneheslo");
        let debug = format!("{auth:?}");
        assert!(!debug.contains("abc123"));
        assert!(!debug.contains("tajneheslo"));
    }
}
