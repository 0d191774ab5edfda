//! Output formatting for the CLI.

use console::style;
use ghia_core::{AssigneeChange, ChangeKind, DesiredState, FallbackAction, Reposlug};
use ghia_github::RemoteIssue;
use serde::Serialize;
use std::fmt::Write;
use std::sync::{Mutex, PoisonError};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output, streamed per issue
    #[default]
    Human,
    /// JSON array printed when the run finishes
    Json,
    /// YAML list printed when the run finishes
    Yaml,
}

/// Outcome of processing one issue.
#[derive(Debug, Clone, Serialize)]
pub struct IssueReport {
    pub reposlug: String,
    pub number: u64,
    pub html_url: String,
    pub changes: Vec<AssigneeChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackAction>,
    /// Whether a patch was sent to GitHub.
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IssueReport {
    #[must_use]
    pub fn new(reposlug: &Reposlug, remote: &RemoteIssue, desired: &DesiredState) -> Self {
        Self {
            reposlug: reposlug.to_string(),
            number: remote.number,
            html_url: remote.html_url.clone(),
            changes: desired.assignee_changes(&remote.issue),
            fallback: desired.fallback.clone(),
            applied: false,
            error: None,
        }
    }
}

/// One entry of the run output.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Issue(IssueReport),
    RepositoryFailed { reposlug: String, error: String },
}

impl Report {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        match self {
            Self::Issue(issue) => issue.error.is_some(),
            Self::RepositoryFailed { .. } => true,
        }
    }
}

/// Trait for human-readable display.
pub trait HumanDisplay {
    /// Lines for stdout and lines for stderr.
    fn human_display(&self) -> (String, String);
}

fn change_symbol(kind: ChangeKind) -> String {
    let symbol = kind.symbol().to_string();
    match kind {
        ChangeKind::Added => style(symbol).green().bold().to_string(),
        ChangeKind::Kept => style(symbol).blue().bold().to_string(),
        ChangeKind::Removed => style(symbol).red().bold().to_string(),
    }
}

fn error_tag() -> String {
    style("ERROR").red().bold().to_string()
}

impl HumanDisplay for IssueReport {
    fn human_display(&self) -> (String, String) {
        let mut out = String::new();
        let mut err = String::new();

        let name = style(format!("{}#{}", self.reposlug, self.number)).bold();
        writeln!(out, "-> {name} ({})", self.html_url).unwrap();

        if let Some(error) = &self.error {
            writeln!(err, "   {}: {error}", error_tag()).unwrap();
            return (out, err);
        }

        for change in &self.changes {
            writeln!(out, "   {} {}", change_symbol(change.kind), change.login).unwrap();
        }

        if let Some(fallback) = &self.fallback {
            let tag = style("FALLBACK").yellow().bold();
            let message = match fallback {
                FallbackAction::Added(label) => format!("added label \"{label}\""),
                FallbackAction::AlreadyPresent(label) => format!("already has label \"{label}\""),
                FallbackAction::Removed(label) => format!("removed label \"{label}\""),
            };
            writeln!(out, "   {tag}: {message}").unwrap();
        }

        (out, err)
    }
}

impl HumanDisplay for Report {
    fn human_display(&self) -> (String, String) {
        match self {
            Self::Issue(issue) => issue.human_display(),
            Self::RepositoryFailed { error, .. } => {
                (String::new(), format!("{}: {error}\n", error_tag()))
            }
        }
    }
}

/// Emits reports.
///
/// Human output is written one whole block per issue; structured formats are
/// buffered until [`Printer::finish`].
#[derive(Debug)]
pub struct Printer {
    format: OutputFormat,
    buffered: Mutex<Vec<Report>>,
}

impl Printer {
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self {
            format,
            buffered: Mutex::new(Vec::new()),
        }
    }

    pub fn emit(&self, report: &Report) {
        match self.format {
            OutputFormat::Human => {
                let (out, err) = report.human_display();
                if !out.is_empty() {
                    print!("{out}");
                }
                if !err.is_empty() {
                    eprint!("{err}");
                }
            }
            OutputFormat::Json | OutputFormat::Yaml => self
                .buffered
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(report.clone()),
        }
    }

    /// Print buffered structured output.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn finish(&self) -> anyhow::Result<()> {
        let reports = std::mem::take(
            &mut *self
                .buffered
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        match self.format {
            OutputFormat::Human => {}
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&reports)?),
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn buffered_len(&self) -> usize {
        self.buffered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
