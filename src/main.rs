use clap::Parser;
use grpc_versions::{
    config::{
        UpdateOptions, DEFAULT_CONFIG_PATH, DEFAULT_FETCH_LIMIT, DEFAULT_KEEP_ACTIVE,
        DEFAULT_MAX_VERSIONS,
    },
    error::FetchError,
    github::{GitHubReleases, DEFAULT_API_URL, DEFAULT_REPO},
    runner::{RunSettings, VersionUpdater},
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grpc-versions")]
#[command(version, about = "Update the tracked gRPC versions from GitHub releases")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Number of releases to fetch
    #[arg(long, default_value_t = DEFAULT_FETCH_LIMIT, value_parser = clap::value_parser!(u8).range(1..=100))]
    limit: u8,

    /// Number of newest releases to mark active when first added
    #[arg(long, default_value_t = DEFAULT_KEEP_ACTIVE)]
    keep_active: usize,

    /// Number of versions kept in the configuration
    #[arg(long, default_value_t = DEFAULT_MAX_VERSIONS)]
    max_versions: usize,

    /// Add new versions as inactive
    #[arg(long)]
    no_activate_new: bool,

    /// Show what would be updated without making changes
    #[arg(long)]
    dry_run: bool,

    /// Repository to read releases from
    #[arg(long, env = "GRPC_VERSIONS_REPO", default_value = DEFAULT_REPO)]
    repo: String,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, hide = true)]
    api_url: String,

    /// GitHub token, raises the API rate limit
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(fetch) = e.downcast_ref::<FetchError>() {
                eprintln!("Error fetching releases: {}", fetch);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let source = GitHubReleases::new(&cli.api_url, &cli.repo, cli.token)?;
    let settings = RunSettings {
        config_path: cli.config,
        limit: cli.limit,
        dry_run: cli.dry_run,
        options: UpdateOptions {
            keep_active: cli.keep_active,
            mark_new_active: !cli.no_activate_new,
            max_versions: cli.max_versions,
        },
    };
    VersionUpdater::new(source, settings).run().await?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
