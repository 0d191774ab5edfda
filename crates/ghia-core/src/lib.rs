//! ghia-core: Rule compilation, issue matching and assignment resolution.
//!
//! This crate provides:
//! - `RuleCompiler`: Turns a rule file into an immutable `RuleSet`
//! - `match_issue`: Finds the assignees whose rules match an `Issue`
//! - `process_issue`: Resolves matches under a `Strategy` into a `DesiredState`
//! - `verify`: Checks webhook signatures against a shared secret
//!
//! Everything here is synchronous and free of I/O.

pub mod compiler;
pub mod error;
pub mod ini;
pub mod issue;
pub mod matcher;
pub mod reposlug;
pub mod resolve;
pub mod rules;
pub mod webhook;

pub use compiler::{DuplicateKeys, RuleCompiler, compile_rules};
pub use error::{CoreError, Result};
pub use issue::Issue;
pub use matcher::{match_issue, rule_matches};
pub use reposlug::Reposlug;
pub use resolve::{
    AssigneeChange, ChangeKind, DesiredState, FallbackAction, Strategy, process_issue,
};
pub use rules::{AssigneeRules, FallbackPolicy, Field, PatternRule, RuleSet};
pub use webhook::{Digest, WebhookEvent, check_signature, sign, verify};
