//! Issue snapshot model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Read-only view of an issue as seen by the matching engine.
///
/// A missing body is represented by an empty string, so matching never has
/// to special-case absent fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    /// Issue title.
    pub title: String,

    /// Issue body; empty when the tracker reports none.
    #[serde(default)]
    pub body: String,

    /// Label names.
    #[serde(default)]
    pub labels: BTreeSet<String>,

    /// Logins currently assigned.
    #[serde(default)]
    pub current_assignees: BTreeSet<String>,
}

impl Issue {
    /// Create an issue with a title and nothing else.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the body. `None` becomes an empty body.
    #[must_use]
    pub fn with_body(mut self, body: Option<impl Into<String>>) -> Self {
        self.body = body.map(Into::into).unwrap_or_default();
        self
    }

    /// Set the labels.
    #[must_use]
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the current assignees.
    #[must_use]
    pub fn with_assignees(
        mut self,
        assignees: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.current_assignees = assignees.into_iter().map(Into::into).collect();
        self
    }

    /// Check if the issue carries a label (exact match).
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}
