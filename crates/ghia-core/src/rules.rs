//! Compiled assignment rules.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Issue attribute a pattern is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Text,
    Label,
    Any,
}

impl Field {
    /// Every recognised field, in display order.
    pub const ALL: [Self; 4] = [Self::Title, Self::Text, Self::Label, Self::Any];

    /// Name as written in rule files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Text => "text",
            Self::Label => "label",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "text" => Ok(Self::Text),
            "label" => Ok(Self::Label),
            "any" => Ok(Self::Any),
            other => Err(other.to_string()),
        }
    }
}

/// A single `field:pattern` rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub field: Field,
    pub pattern: Regex,
}

impl PatternRule {
    #[must_use]
    pub const fn new(field: Field, pattern: Regex) -> Self {
        Self { field, pattern }
    }
}

impl fmt::Display for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.pattern.as_str())
    }
}

/// Rules owned by one assignee.
#[derive(Debug, Clone)]
pub struct AssigneeRules {
    pub login: String,
    pub rules: Vec<PatternRule>,
}

/// Label applied to issues that end up with nobody assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    /// Label name.
    pub label: String,

    /// Remove the label again once the issue has assignees.
    #[serde(default)]
    pub remove_when_assigned: bool,
}

impl FallbackPolicy {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            remove_when_assigned: false,
        }
    }

    #[must_use]
    pub const fn with_removal(mut self, remove: bool) -> Self {
        self.remove_when_assigned = remove;
        self
    }
}

/// Immutable, validated rule set.
///
/// Built once by [`crate::RuleCompiler`] and shared read-only between any
/// number of concurrent matching calls.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    assignees: Vec<AssigneeRules>,
    fallback: Option<FallbackPolicy>,
}

impl RuleSet {
    /// Rule set with no assignees and no fallback.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) const fn from_parts(
        assignees: Vec<AssigneeRules>,
        fallback: Option<FallbackPolicy>,
    ) -> Self {
        Self {
            assignees,
            fallback,
        }
    }

    /// Assignees in file order.
    #[must_use]
    pub fn assignees(&self) -> &[AssigneeRules] {
        &self.assignees
    }

    /// Rules for a login, if it is configured.
    #[must_use]
    pub fn rules_for(&self, login: &str) -> Option<&[PatternRule]> {
        self.assignees
            .iter()
            .find(|a| a.login == login)
            .map(|a| a.rules.as_slice())
    }

    /// Fallback label policy.
    #[must_use]
    pub const fn fallback(&self) -> Option<&FallbackPolicy> {
        self.fallback.as_ref()
    }

    /// Convenience accessor for the fallback label name.
    #[must_use]
    pub fn fallback_label(&self) -> Option<&str> {
        self.fallback.as_ref().map(|f| f.label.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignees.is_empty()
    }

    /// Overlay another rule set: its assignees replace same-named ones here,
    /// and its fallback (if any) wins.
    #[must_use]
    pub fn merged_with(mut self, other: Self) -> Self {
        for incoming in other.assignees {
            if let Some(existing) = self
                .assignees
                .iter_mut()
                .find(|a| a.login == incoming.login)
            {
                *existing = incoming;
            } else {
                self.assignees.push(incoming);
            }
        }
        if other.fallback.is_some() {
            self.fallback = other.fallback;
        }
        self
    }
}
