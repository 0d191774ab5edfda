//! Loading rule and auth files from disk and the environment.

use crate::auth::{AuthConfig, GITHUB_SECTION};
use crate::error::{ConfigError, Result};
use ghia_core::compiler::{FALLBACK_SECTION, PATTERNS_SECTION};
use ghia_core::ini::Document;
use ghia_core::{RuleCompiler, RuleSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the GitHub user shown on the status page.
pub const USER_ENV: &str = "GITHUB_USER";
/// Environment variable listing configuration files, separated by `:`.
pub const CONFIG_ENV: &str = "GHIA_CONFIG";

fn read_document(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Document::parse(&text).map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and compile a rule file.
///
/// # Errors
/// Returns error if the file cannot be read or any rule is invalid.
pub fn load_rules(path: impl AsRef<Path>) -> Result<RuleSet> {
    load_rules_with(path, RuleCompiler::new())
}

/// Load a rule file with a specific compiler configuration.
///
/// # Errors
/// Returns error if the file cannot be read or any rule is invalid.
pub fn load_rules_with(path: impl AsRef<Path>, compiler: RuleCompiler) -> Result<RuleSet> {
    let path = path.as_ref();
    let doc = read_document(path)?;
    let rules = compiler
        .compile_document(&doc)
        .map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), assignees = rules.assignees().len(), "Loaded rules");
    Ok(rules)
}

/// Load an auth file.
///
/// # Errors
/// Returns error if the file cannot be read or has no token.
pub fn load_auth(path: impl AsRef<Path>) -> Result<AuthConfig> {
    let path = path.as_ref();
    let doc = read_document(path)?;
    AuthConfig::from_document(&doc).map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Everything the web frontend needs, loaded once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub user: String,
    pub auth: AuthConfig,
    pub rules: RuleSet,
}

impl ServerConfig {
    /// Load from `GITHUB_USER` and `GHIA_CONFIG`.
    ///
    /// # Errors
    /// See [`ServerConfig::from_vars`].
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var(USER_ENV).ok(),
            std::env::var(CONFIG_ENV).ok(),
        )
    }

    /// Load from raw variable values.
    ///
    /// # Errors
    /// Returns error if the user or file list is missing, or any file fails
    /// to load.
    pub fn from_vars(user: Option<String>, config: Option<String>) -> Result<Self> {
        let user = user
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingUser)?;

        let files: Vec<PathBuf> = config
            .as_deref()
            .unwrap_or_default()
            .split(':')
            .filter(|f| !f.is_empty())
            .map(PathBuf::from)
            .collect();
        if files.is_empty() {
            return Err(ConfigError::NoConfigFiles);
        }

        Self::from_files(user, &files)
    }

    /// Load from a list of files, each an auth file, a rule file, or both.
    ///
    /// Later files override earlier ones: a later token/secret replaces the
    /// earlier pair, and later assignees replace same-named ones.
    ///
    /// # Errors
    /// Returns error if a file is unreadable, invalid, or neither kind, or if
    /// no file provides a token.
    pub fn from_files(user: impl Into<String>, files: &[PathBuf]) -> Result<Self> {
        let mut auth: Option<AuthConfig> = None;
        let mut rules = RuleSet::empty();
        let compiler = RuleCompiler::new();

        for path in files {
            let doc = read_document(path)?;
            let invalid = |source| ConfigError::Invalid {
                path: path.clone(),
                source,
            };

            let is_auth = doc.section(GITHUB_SECTION).is_some();
            let is_rules = doc.section(PATTERNS_SECTION).is_some();
            if !is_auth && !is_rules {
                if doc.section(FALLBACK_SECTION).is_some() {
                    warn!(path = %path.display(), "[fallback] without [patterns]");
                }
                return Err(ConfigError::UnrecognizedFile(path.clone()));
            }

            if is_auth {
                auth = Some(AuthConfig::from_document(&doc).map_err(invalid)?);
            }
            if is_rules {
                let loaded = compiler.compile_document(&doc).map_err(invalid)?;
                rules = rules.merged_with(loaded);
            }
            debug!(path = %path.display(), is_auth, is_rules, "Loaded configuration file");
        }

        let auth = auth.ok_or(ConfigError::MissingAuth)?;
        if rules.is_empty() {
            warn!("No assignment rules configured");
        }

        let config = Self {
            user: user.into(),
            auth,
            rules,
        };
        info!(
            user = %config.user,
            assignees = config.rules.assignees().len(),
            fallback = config.rules.fallback_label().unwrap_or("-"),
            webhook_secret = config.auth.secret.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }
}
