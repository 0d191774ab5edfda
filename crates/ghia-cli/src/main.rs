//! ghia - assigns GitHub issues to people based on rules.

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use ghia_core::{DuplicateKeys, Reposlug, RuleCompiler, Strategy};
use ghia_github::GitHubClient;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Exit code when at least one repository or issue could not be processed.
const EXIT_PARTIAL_FAILURE: u8 = 10;

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum StrategyArg {
    /// Keep current assignees and add matched ones
    #[default]
    Append,
    /// Only assign issues that have no assignees
    Set,
    /// Replace assignees with the matched ones
    Change,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Append => Self::Append,
            StrategyArg::Set => Self::Set,
            StrategyArg::Change => Self::Change,
        }
    }
}

#[derive(Parser)]
#[command(name = "ghia")]
#[command(author, version, about = "Automatic GitHub issue assignment")]
struct Cli {
    /// Repositories to process, as owner/name
    #[arg(value_name = "REPOSLUG", required = true)]
    reposlugs: Vec<Reposlug>,

    /// How to treat existing assignees
    #[arg(long, short = 's', value_enum, ignore_case = true, default_value = "append")]
    strategy: StrategyArg,

    /// Show what would change without updating GitHub
    #[arg(long, short = 'd')]
    dry_run: bool,

    /// File with authorization configuration
    #[arg(long, short = 'a', value_name = "FILENAME")]
    config_auth: PathBuf,

    /// File with assignment rules configuration
    #[arg(long, short = 'r', value_name = "FILENAME")]
    config_rules: PathBuf,

    /// Merge repeated assignee entries in the rules file instead of failing
    #[arg(long)]
    merge_duplicates: bool,

    /// Maximum number of concurrent GitHub requests
    #[arg(long, short = 'j', default_value = "4", value_parser = clap::value_parser!(u16).range(1..))]
    jobs: u16,

    /// Output format
    #[arg(long, default_value = "human")]
    format: output::OutputFormat,
}

impl Cli {
    fn rule_compiler(&self) -> RuleCompiler {
        let duplicates = if self.merge_duplicates {
            DuplicateKeys::Merge
        } else {
            DuplicateKeys::Reject
        };
        RuleCompiler::new().with_duplicates(duplicates)
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let auth = ghia_config::load_auth(&cli.config_auth)
        .with_context(|| format!("Invalid value for '--config-auth': {}", cli.config_auth.display()))?;
    let rules = ghia_config::load_rules_with(&cli.config_rules, cli.rule_compiler())
        .with_context(|| {
            format!("Invalid value for '--config-rules': {}", cli.config_rules.display())
        })?;
    let client = GitHubClient::new(&auth.token).context("Failed to create GitHub client")?;

    let options = commands::RunOptions {
        strategy: cli.strategy.into(),
        dry_run: cli.dry_run,
        jobs: usize::from(cli.jobs),
    };
    let printer = output::Printer::new(cli.format);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let summary = runtime.block_on(commands::run(
        client,
        rules,
        cli.reposlugs,
        options,
        &printer,
    ));
    printer.finish()?;

    if summary.failures() > 0 {
        Ok(ExitCode::from(EXIT_PARTIAL_FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
