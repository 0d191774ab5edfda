//! Issue matching against a rule set.
//!
//! # Design Decisions
//! - Patterns are searched anywhere in the field, not anchored
//! - An assignee matches if any of its rules matches (OR)
//! - Result is a set, so multiple hits by one assignee count once
//! - Pure and read-only: safe to call concurrently on a shared `RuleSet`

use crate::issue::Issue;
use crate::rules::{Field, PatternRule, RuleSet};
use std::collections::BTreeSet;

/// Logins of every assignee with at least one matching rule.
#[must_use]
pub fn match_issue(issue: &Issue, rules: &RuleSet) -> BTreeSet<String> {
    rules
        .assignees()
        .iter()
        .filter(|a| a.rules.iter().any(|rule| rule_matches(rule, issue)))
        .map(|a| a.login.clone())
        .collect()
}

/// Whether a single rule matches an issue.
#[must_use]
pub fn rule_matches(rule: &PatternRule, issue: &Issue) -> bool {
    let in_labels = || issue.labels.iter().any(|l| rule.pattern.is_match(l));

    match rule.field {
        Field::Title => rule.pattern.is_match(&issue.title),
        Field::Text => rule.pattern.is_match(&issue.body),
        Field::Label => in_labels(),
        Field::Any => {
            rule.pattern.is_match(&issue.title) || rule.pattern.is_match(&issue.body) || in_labels()
        }
    }
}
