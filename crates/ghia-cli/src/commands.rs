//! Batch assignment over one or more repositories.
//!
//! Repositories and their issues are processed concurrently with at most
//! `jobs` GitHub requests in flight. A failing repository or issue is
//! reported and skipped; it never stops the rest of the batch.
//!
//! Reports are emitted per repository, in the order the repositories were
//! given, with issues ordered by number.

use crate::output::{IssueReport, Printer, Report};
use ghia_core::{Reposlug, RuleSet, Strategy, process_issue};
use ghia_github::{IssuePatch, IssueTracker, RemoteIssue};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Settings for one batch run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub strategy: Strategy,
    pub dry_run: bool,
    pub jobs: usize,
}

/// Everything reported during a run, in emission order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<Report>,
}

impl RunSummary {
    #[must_use]
    pub fn failures(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failure()).count()
    }
}

struct Shared<T> {
    tracker: T,
    rules: RuleSet,
    options: RunOptions,
    permits: Semaphore,
}

/// Process every open issue of every repository.
pub async fn run<T: IssueTracker + 'static>(
    tracker: T,
    rules: RuleSet,
    reposlugs: Vec<Reposlug>,
    options: RunOptions,
    printer: &Printer,
) -> RunSummary {
    let shared = Arc::new(Shared {
        tracker,
        rules,
        options,
        permits: Semaphore::new(options.jobs.max(1)),
    });

    let handles: Vec<_> = reposlugs
        .into_iter()
        .map(|reposlug| tokio::spawn(process_repository(Arc::clone(&shared), reposlug)))
        .collect();

    let mut summary = RunSummary::default();
    for handle in handles {
        match handle.await {
            Ok(reports) => {
                for report in &reports {
                    printer.emit(report);
                }
                summary.reports.extend(reports);
            }
            Err(e) => warn!(error = %e, "Repository task failed"),
        }
    }

    summary
}

async fn process_repository<T: IssueTracker + 'static>(
    shared: Arc<Shared<T>>,
    reposlug: Reposlug,
) -> Vec<Report> {
    let listed = {
        let _permit = shared.permits.acquire().await;
        shared.tracker.list_issues(&reposlug).await
    };

    let issues = match listed {
        Ok(issues) => issues,
        Err(e) => {
            warn!(
                reposlug = %reposlug,
                rate_limited = e.is_rate_limited(),
                not_found = e.is_not_found(),
                error = %e,
                "Could not list issues"
            );
            return vec![Report::RepositoryFailed {
                reposlug: reposlug.to_string(),
                error: format!("Could not list issues for repository {reposlug}"),
            }];
        }
    };

    let reposlug = Arc::new(reposlug);
    let mut tasks = JoinSet::new();
    for remote in issues {
        tasks.spawn(process_one(Arc::clone(&shared), Arc::clone(&reposlug), remote));
    }

    let mut reports = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => warn!(reposlug = %reposlug, error = %e, "Issue task failed"),
        }
    }
    reports.sort_by_key(|r| r.number);
    reports.into_iter().map(Report::Issue).collect()
}

async fn process_one<T: IssueTracker + 'static>(
    shared: Arc<Shared<T>>,
    reposlug: Arc<Reposlug>,
    remote: RemoteIssue,
) -> IssueReport {
    let desired = process_issue(&remote.issue, shared.options.strategy, &shared.rules);
    let mut report = IssueReport::new(&reposlug, &remote, &desired);

    match IssuePatch::from_desired(&remote.issue, &desired) {
        Some(_) if shared.options.dry_run => {
            debug!(reposlug = %reposlug, number = remote.number, "Dry run, not updating");
        }
        Some(patch) => {
            let _permit = shared.permits.acquire().await;
            match shared.tracker.update_issue(&remote, &patch).await {
                Ok(()) => report.applied = true,
                Err(e) => {
                    warn!(
                        reposlug = %reposlug,
                        number = remote.number,
                        rate_limited = e.is_rate_limited(),
                        not_found = e.is_not_found(),
                        error = %e,
                        "Update failed"
                    );
                    report.error = Some(format!(
                        "Could not update issue {reposlug}#{}",
                        remote.number
                    ));
                }
            }
        }
        None => debug!(reposlug = %reposlug, number = remote.number, "Nothing to change"),
    }

    report
}
