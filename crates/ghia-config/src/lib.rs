//! Configuration loading for ghia.
//!
//! Reads two kinds of INI files:
//! - auth files: `[github]` with `token` and optional `secret`
//! - rule files: `[patterns]` and optional `[fallback]`
//!
//! The web frontend may pass several files through `GHIA_CONFIG`; each may be
//! either kind or both.

pub mod auth;
pub mod error;
pub mod loader;

pub use auth::AuthConfig;
pub use error::{ConfigError, Result};
pub use loader::{ServerConfig, load_auth, load_rules, load_rules_with};
