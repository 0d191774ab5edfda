//! GitHub backend for ghia.
//!
//! Fetches issues from a repository and applies the changes computed by
//! `ghia_core::process_issue`. The [`IssueTracker`] trait lets frontends run
//! against an in-memory tracker in tests.

pub mod client;
pub mod error;
pub mod model;

use ghia_core::Reposlug;
use std::future::Future;

pub use client::GitHubClient;
pub use error::{GitHubError, Result};
pub use model::{IssuePatch, IssuesEvent, PROCESSED_ACTIONS, RawIssue, RemoteIssue};

/// Source of issues and sink for their updates.
pub trait IssueTracker: Send + Sync {
    /// All open issues of a repository.
    fn list_issues(
        &self,
        reposlug: &Reposlug,
    ) -> impl Future<Output = Result<Vec<RemoteIssue>>> + Send;

    /// Apply a patch to one issue.
    fn update_issue(
        &self,
        issue: &RemoteIssue,
        patch: &IssuePatch,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl<T: IssueTracker> IssueTracker for std::sync::Arc<T> {
    fn list_issues(
        &self,
        reposlug: &Reposlug,
    ) -> impl Future<Output = Result<Vec<RemoteIssue>>> + Send {
        (**self).list_issues(reposlug)
    }

    fn update_issue(
        &self,
        issue: &RemoteIssue,
        patch: &IssuePatch,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).update_issue(issue, patch)
    }
}
