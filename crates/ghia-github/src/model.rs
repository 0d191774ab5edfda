//! GitHub issue payloads and the patches sent back.

use ghia_core::{DesiredState, Issue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawUser {
    login: String,
}

/// Issue as returned by the REST API or embedded in a webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    number: u64,
    url: String,
    html_url: String,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    assignees: Vec<RawUser>,
}

/// An issue together with the coordinates needed to update it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIssue {
    pub number: u64,
    /// API URL used for updates.
    pub url: String,
    /// Browser URL used in reports.
    pub html_url: String,
    pub issue: Issue,
}

impl From<RawIssue> for RemoteIssue {
    fn from(raw: RawIssue) -> Self {
        Self {
            number: raw.number,
            url: raw.url,
            html_url: raw.html_url,
            issue: Issue::new(raw.title)
                .with_body(raw.body)
                .with_labels(raw.labels.into_iter().map(|l| l.name))
                .with_assignees(raw.assignees.into_iter().map(|u| u.login)),
        }
    }
}

impl RemoteIssue {
    /// Decode a single issue object.
    ///
    /// # Errors
    /// Returns error if required fields are missing or mistyped.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value::<RawIssue>(value).map(Into::into)
    }
}

/// Body of a `PATCH` to an issue; only changed fields are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssuePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl IssuePatch {
    /// Patch that moves `issue` to `desired`, or `None` if nothing changes.
    #[must_use]
    pub fn from_desired(issue: &Issue, desired: &DesiredState) -> Option<Self> {
        let patch = Self {
            assignees: desired
                .assignees_changed(issue)
                .then(|| desired.assignees.iter().cloned().collect()),
            labels: desired
                .labels_changed()
                .then(|| desired.final_labels(issue).into_iter().collect()),
        };
        (patch != Self::default()).then_some(patch)
    }
}

/// Issue actions that trigger processing.
pub const PROCESSED_ACTIONS: &[&str] = &[
    "opened",
    "edited",
    "transferred",
    "reopened",
    "assigned",
    "unassigned",
    "labeled",
    "unlabeled",
];

/// Body of an `issues` webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: RawIssue,
}

impl IssuesEvent {
    /// Whether this action should trigger assignment.
    #[must_use]
    pub fn is_processed(&self) -> bool {
        PROCESSED_ACTIONS.contains(&self.action.as_str())
    }
}
