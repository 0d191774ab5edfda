//! ghia-web - assigns GitHub issues as webhook events arrive.

use anyhow::{Context, Result};
use clap::Parser;
use ghia_config::ServerConfig;
use ghia_github::GitHubClient;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "ghia-web")]
#[command(author, version, about = "Webhook server for automatic GitHub issue assignment")]
#[command(after_help = "Configuration is read from GITHUB_USER and GHIA_CONFIG \
    (colon-separated list of auth and rule files).")]
struct Cli {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "5000", env = "GHIA_PORT")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1", env = "GHIA_HOST")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "ghia_server=info,ghia_config=info,ghia_github=info,tower_http=info".into()
        }))
        .init();

    let cli = Cli::parse();

    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    let client = GitHubClient::new(&config.auth.token).context("Failed to create GitHub client")?;

    ghia_server::serve(config, client, &cli.host, cli.port).await
}
