//! Assignment resolution.
//!
//! Combines the assignees found by [`crate::match_issue`] with the ones an
//! issue already has, then decides where the fallback label goes. The output
//! is a [`DesiredState`]; applying it is up to the caller.

use crate::issue::Issue;
use crate::matcher::match_issue;
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How matched assignees combine with existing ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Keep current assignees and add matched ones.
    #[default]
    Append,
    /// Use matched assignees only if nobody is assigned yet.
    Set,
    /// Replace current assignees with matched ones.
    Change,
}

impl Strategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Set => "set",
            Self::Change => "change",
        }
    }

    /// Final assignee set for this strategy.
    #[must_use]
    pub fn combine(
        self,
        current: &BTreeSet<String>,
        matched: BTreeSet<String>,
    ) -> BTreeSet<String> {
        match self {
            Self::Append => current.union(&matched).cloned().collect(),
            Self::Set if current.is_empty() => matched,
            Self::Set => current.clone(),
            Self::Change => matched,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "set" => Ok(Self::Set),
            "change" => Ok(Self::Change),
            _ => Err(format!("unknown strategy '{s}' (expected append, set or change)")),
        }
    }
}

/// What happened to the fallback label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "label", rename_all = "snake_case")]
pub enum FallbackAction {
    Added(String),
    AlreadyPresent(String),
    Removed(String),
}

/// How one login is affected by a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Kept,
    Removed,
}

impl ChangeKind {
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Added => '+',
            Self::Kept => '=',
            Self::Removed => '-',
        }
    }
}

/// A login with its change kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeChange {
    pub login: String,
    pub kind: ChangeKind,
}

/// The state an issue should end up in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    /// Assignees the issue should have.
    pub assignees: BTreeSet<String>,

    /// Labels to add.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels_to_add: BTreeSet<String>,

    /// Labels to remove.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels_to_remove: BTreeSet<String>,

    /// Fallback decision, if a fallback label is configured and relevant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackAction>,
}

impl DesiredState {
    /// Whether the assignee set differs from the issue's current one.
    #[must_use]
    pub fn assignees_changed(&self, issue: &Issue) -> bool {
        self.assignees != issue.current_assignees
    }

    /// Whether any label is added or removed.
    #[must_use]
    pub fn labels_changed(&self) -> bool {
        !self.labels_to_add.is_empty() || !self.labels_to_remove.is_empty()
    }

    /// Whether applying this state would change nothing.
    #[must_use]
    pub fn is_noop(&self, issue: &Issue) -> bool {
        !self.assignees_changed(issue) && !self.labels_changed()
    }

    /// The issue's labels after applying this state.
    #[must_use]
    pub fn final_labels(&self, issue: &Issue) -> BTreeSet<String> {
        issue
            .labels
            .iter()
            .chain(&self.labels_to_add)
            .filter(|l| !self.labels_to_remove.contains(*l))
            .cloned()
            .collect()
    }

    /// Every login that was or will be assigned, sorted case-insensitively.
    #[must_use]
    pub fn assignee_changes(&self, issue: &Issue) -> Vec<AssigneeChange> {
        let mut logins: Vec<&String> = issue
            .current_assignees
            .union(&self.assignees)
            .collect();
        logins.sort_by_key(|l| l.to_lowercase());

        logins
            .into_iter()
            .map(|login| {
                let kind = match (
                    issue.current_assignees.contains(login),
                    self.assignees.contains(login),
                ) {
                    (true, true) => ChangeKind::Kept,
                    (false, _) => ChangeKind::Added,
                    (true, false) => ChangeKind::Removed,
                };
                AssigneeChange {
                    login: login.clone(),
                    kind,
                }
            })
            .collect()
    }
}

/// Match an issue and resolve the result under a strategy.
#[must_use]
pub fn process_issue(issue: &Issue, strategy: Strategy, rules: &RuleSet) -> DesiredState {
    let matched = match_issue(issue, rules);
    let assignees = strategy.combine(&issue.current_assignees, matched);

    let mut state = DesiredState {
        assignees,
        ..DesiredState::default()
    };

    if let Some(policy) = rules.fallback() {
        let label = &policy.label;
        if state.assignees.is_empty() {
            if issue.has_label(label) {
                state.fallback = Some(FallbackAction::AlreadyPresent(label.clone()));
            } else {
                state.labels_to_add.insert(label.clone());
                state.fallback = Some(FallbackAction::Added(label.clone()));
            }
        } else if policy.remove_when_assigned && issue.has_label(label) {
            state.labels_to_remove.insert(label.clone());
            state.fallback = Some(FallbackAction::Removed(label.clone()));
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_rules;
    use pretty_assertions::assert_eq;

    const RULES: &str = "\
[patterns]
ghia-jane=
    text:commit
";

    const RULES_WITH_FALLBACK: &str = "\
[patterns]
ghia-jane=
    text:commit
[fallback]
label=Need assignment
";

    fn readme_issue() -> Issue {
        Issue::new("Spelling error in the README file")
            .with_body(Some(
                "It looks like you accidently spelled 'commit' with two 't's.",
            ))
            .with_labels(["bug"])
            .with_assignees(["Codertocat"])
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_readme_issue_per_strategy() {
        let rules = compile_rules(RULES).unwrap();
        let issue = readme_issue();

        assert_eq!(
            process_issue(&issue, Strategy::Append, &rules).assignees,
            set(&["Codertocat", "ghia-jane"])
        );
        assert_eq!(
            process_issue(&issue, Strategy::Set, &rules).assignees,
            set(&["Codertocat"])
        );
        assert_eq!(
            process_issue(&issue, Strategy::Change, &rules).assignees,
            set(&["ghia-jane"])
        );
    }

    #[test]
    fn test_set_uses_matched_when_unassigned() {
        let rules = compile_rules(RULES).unwrap();
        let issue = readme_issue().with_assignees(Vec::<String>::new());
        assert_eq!(
            process_issue(&issue, Strategy::Set, &rules).assignees,
            set(&["ghia-jane"])
        );
    }

    #[test]
    fn test_empty_rules_keep_or_clear_assignees() {
        let rules = RuleSet::empty();
        let issue = readme_issue();

        assert_eq!(process_issue(&issue, Strategy::Append, &rules).assignees, set(&["Codertocat"]));
        assert_eq!(process_issue(&issue, Strategy::Set, &rules).assignees, set(&["Codertocat"]));
        assert!(process_issue(&issue, Strategy::Change, &rules).assignees.is_empty());
    }

    #[test]
    fn test_append_is_idempotent() {
        let rules = compile_rules(RULES).unwrap();
        let issue = readme_issue();

        let first = process_issue(&issue, Strategy::Append, &rules);
        let applied = issue.clone().with_assignees(first.assignees.clone());
        let second = process_issue(&applied, Strategy::Append, &rules);

        assert_eq!(first.assignees, second.assignees);
        assert!(second.is_noop(&applied));
    }

    #[test]
    fn test_change_ignores_current_assignees() {
        let rules = compile_rules(RULES).unwrap();
        let a = readme_issue().with_assignees(["x", "y"]);
        let b = readme_issue().with_assignees(Vec::<String>::new());

        assert_eq!(
            process_issue(&a, Strategy::Change, &rules).assignees,
            process_issue(&b, Strategy::Change, &rules).assignees
        );
    }

    #[test]
    fn test_fallback_added_when_nobody_assigned() {
        let rules = compile_rules(RULES_WITH_FALLBACK).unwrap();
        let issue = Issue::new("unrelated").with_labels(["bug"]);

        let state = process_issue(&issue, Strategy::Append, &rules);
        assert!(state.assignees.is_empty());
        assert_eq!(state.labels_to_add, set(&["Need assignment"]));
        assert_eq!(
            state.fallback,
            Some(FallbackAction::Added("Need assignment".into()))
        );
        assert_eq!(
            state.final_labels(&issue),
            set(&["Need assignment", "bug"])
        );
    }

    #[test]
    fn test_fallback_already_present_is_not_re_added() {
        let rules = compile_rules(RULES_WITH_FALLBACK).unwrap();
        let issue = Issue::new("unrelated").with_labels(["Need assignment"]);

        let state = process_issue(&issue, Strategy::Append, &rules);
        assert!(state.labels_to_add.is_empty());
        assert_eq!(
            state.fallback,
            Some(FallbackAction::AlreadyPresent("Need assignment".into()))
        );
        assert!(state.is_noop(&issue));
    }

    #[test]
    fn test_no_fallback_when_assigned() {
        let rules = compile_rules(RULES_WITH_FALLBACK).unwrap();
        let state = process_issue(&readme_issue(), Strategy::Append, &rules);
        assert!(state.labels_to_add.is_empty());
        assert!(state.fallback.is_none());
    }

    #[test]
    fn test_fallback_kept_when_assigned_by_default() {
        let rules = compile_rules(RULES_WITH_FALLBACK).unwrap();
        let issue = readme_issue().with_labels(["Need assignment"]);

        let state = process_issue(&issue, Strategy::Append, &rules);
        assert!(state.labels_to_remove.is_empty());
    }

    #[test]
    fn test_fallback_removed_when_policy_asks() {
        let rules =
            compile_rules(&format!("{RULES_WITH_FALLBACK}remove=true\n")).unwrap();
        let issue = readme_issue().with_labels(["Need assignment", "bug"]);

        let state = process_issue(&issue, Strategy::Append, &rules);
        assert_eq!(state.labels_to_remove, set(&["Need assignment"]));
        assert_eq!(
            state.fallback,
            Some(FallbackAction::Removed("Need assignment".into()))
        );
        assert_eq!(state.final_labels(&issue), set(&["bug"]));
    }

    #[test]
    fn test_no_fallback_without_policy() {
        let rules = compile_rules(RULES).unwrap();
        let state = process_issue(&Issue::new("unrelated"), Strategy::Change, &rules);
        assert!(state.assignees.is_empty());
        assert!(state.labels_to_add.is_empty());
        assert!(state.fallback.is_none());
    }

    #[test]
    fn test_assignee_changes_sorted_case_insensitively() {
        let issue = Issue::new("t").with_assignees(["bob", "Alice"]);
        let state = DesiredState {
            assignees: set(&["alice2", "Alice"]),
            ..DesiredState::default()
        };

        let changes: Vec<(String, char)> = state
            .assignee_changes(&issue)
            .into_iter()
            .map(|c| (c.login, c.kind.symbol()))
            .collect();
        assert_eq!(
            changes,
            vec![
                ("Alice".to_string(), '='),
                ("alice2".to_string(), '+'),
                ("bob".to_string(), '-'),
            ]
        );
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("APPEND".parse::<Strategy>(), Ok(Strategy::Append));
        assert_eq!("change".parse::<Strategy>(), Ok(Strategy::Change));
        assert!("merge".parse::<Strategy>().is_err());
    }
}
