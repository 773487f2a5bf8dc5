//! HirePro CLI
//!
//! Serves the jobs API, or runs a one-shot ingestion for cron use.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hirepro::{
    config::Config,
    error::Result,
    models::Category,
    pipeline,
    server,
    services::ListingScraper,
    storage::JobStore,
};

/// HirePro - talentd.in job listings scraper and API
#[derive(Parser, Debug)]
#[command(name = "hirepro", version, about = "Job listings scraper and API")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve,

    /// Run one ingestion pass and print the summary as JSON
    Scrape {
        /// Restrict the run to specific categories (default: all)
        #[arg(long = "category")]
        categories: Vec<String>,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }

        Command::Scrape { categories } => {
            let categories = if categories.is_empty() {
                Category::ALL.to_vec()
            } else {
                categories
                    .iter()
                    .map(|s| s.parse::<Category>())
                    .collect::<Result<Vec<_>>>()?
            };

            let store = JobStore::connect(
                &config.server.database_url,
                config.server.max_connections,
            )
            .await?;
            store.init_schema().await?;
            let scraper = ListingScraper::new(config.scraper.clone(), &config.selectors)?;

            let summary = pipeline::run_ingestion(&scraper, &store, &categories).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            tracing::info!(
                written = summary.total_written(),
                rows = store.count().await?,
                "ingestion finished"
            );

            if summary.all_failed() {
                tracing::error!("every category failed");
                std::process::exit(1);
            }
        }

        Command::Validate => {
            let config = Config::load(&cli.config)?;
            config.validate()?;
            tracing::info!("configuration OK");
            tracing::info!(
                "  store: {} (pool of {})",
                config.server.database_url,
                config.server.max_connections
            );
            tracing::info!(
                "  rate limit: {} requests / {}s",
                config.rate_limit.max_requests,
                config.rate_limit.window_secs
            );
        }
    }

    Ok(())
}
