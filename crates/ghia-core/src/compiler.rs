//! Rule file compilation.
//!
//! # Data Flow
//! ```text
//! rule file text
//!     → ini::Document (sections, entries, line numbers)
//!     → [patterns]: one AssigneeRules per key, one PatternRule per value line
//!     → [fallback]: FallbackPolicy
//!     → RuleSet (validated, immutable)
//! ```
//!
//! All validation happens here; nothing downstream can fail on a bad rule.

use crate::error::{CoreError, Result};
use crate::ini::{Document, Entry};
use crate::rules::{AssigneeRules, FallbackPolicy, Field, PatternRule, RuleSet};
use regex::Regex;

pub const PATTERNS_SECTION: &str = "patterns";
pub const FALLBACK_SECTION: &str = "fallback";
const FALLBACK_LABEL_KEY: &str = "label";
const FALLBACK_REMOVE_KEY: &str = "remove";

/// How a second `[patterns]` entry for the same assignee is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateKeys {
    /// Fail with [`CoreError::DuplicateAssignee`].
    #[default]
    Reject,
    /// Append the later rules to the earlier ones.
    Merge,
}

/// Turns rule file text into a [`RuleSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleCompiler {
    duplicates: DuplicateKeys,
}

impl RuleCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the duplicate-assignee behaviour.
    #[must_use]
    pub const fn with_duplicates(mut self, duplicates: DuplicateKeys) -> Self {
        self.duplicates = duplicates;
        self
    }

    #[must_use]
    pub const fn duplicates(&self) -> DuplicateKeys {
        self.duplicates
    }

    /// Compile rule file text.
    ///
    /// # Errors
    /// Returns a configuration-class [`CoreError`] naming the offending
    /// assignee and line for any invalid entry.
    pub fn compile(&self, text: &str) -> Result<RuleSet> {
        let doc = Document::parse(text)?;
        self.compile_document(&doc)
    }

    /// Compile an already parsed document.
    ///
    /// # Errors
    /// See [`RuleCompiler::compile`].
    pub fn compile_document(&self, doc: &Document) -> Result<RuleSet> {
        let patterns = doc
            .section(PATTERNS_SECTION)
            .ok_or_else(|| CoreError::MissingSection(PATTERNS_SECTION.to_string()))?;

        let mut assignees: Vec<AssigneeRules> = Vec::new();
        for entry in &patterns.entries {
            let rules = compile_entry(entry)?;
            match assignees.iter_mut().find(|a| a.login == entry.key) {
                Some(existing) => match self.duplicates {
                    DuplicateKeys::Reject => {
                        return Err(CoreError::DuplicateAssignee {
                            assignee: entry.key.clone(),
                            line: entry.line,
                        });
                    }
                    DuplicateKeys::Merge => existing.rules.extend(rules),
                },
                None => assignees.push(AssigneeRules {
                    login: entry.key.clone(),
                    rules,
                }),
            }
        }

        let fallback = compile_fallback(doc)?;
        Ok(RuleSet::from_parts(assignees, fallback))
    }
}

/// Compile with the default settings.
///
/// # Errors
/// See [`RuleCompiler::compile`].
pub fn compile_rules(text: &str) -> Result<RuleSet> {
    RuleCompiler::new().compile(text)
}

fn compile_entry(entry: &Entry) -> Result<Vec<PatternRule>> {
    entry
        .value_lines()
        .map(|line| {
            let (field, pattern) =
                line.text
                    .split_once(':')
                    .ok_or_else(|| CoreError::MalformedRule {
                        assignee: entry.key.clone(),
                        entry: line.text.clone(),
                        line: line.line,
                    })?;
            let field: Field = field.trim().parse().map_err(|field| CoreError::UnknownField {
                assignee: entry.key.clone(),
                field,
                line: line.line,
            })?;
            let pattern = Regex::new(pattern).map_err(|source| CoreError::InvalidPattern {
                assignee: entry.key.clone(),
                line: line.line,
                source,
            })?;
            Ok(PatternRule::new(field, pattern))
        })
        .collect()
}

fn compile_fallback(doc: &Document) -> Result<Option<FallbackPolicy>> {
    let Some(section) = doc.section(FALLBACK_SECTION) else {
        return Ok(None);
    };

    let label = section
        .get(FALLBACK_LABEL_KEY)
        .map(Entry::value)
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| CoreError::MissingKey {
            section: FALLBACK_SECTION.to_string(),
            key: FALLBACK_LABEL_KEY.to_string(),
        })?;

    let remove = match section.get(FALLBACK_REMOVE_KEY) {
        Some(entry) => {
            let value = entry.value();
            parse_bool(&value).ok_or_else(|| CoreError::InvalidValue {
                section: FALLBACK_SECTION.to_string(),
                key: FALLBACK_REMOVE_KEY.to_string(),
                value,
            })?
        }
        None => false,
    };

    Ok(Some(FallbackPolicy::new(label.trim()).with_removal(remove)))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}
