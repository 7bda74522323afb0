//! advisor-cache CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use advisor_cache::cli::{Cli, Commands};
use advisor_cache::infrastructure::config::ConfigLoader;
use advisor_cache::infrastructure::logging::{prune_old_logs, LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A broken config still gets console logging; the command reports the error.
    let _logger = match ConfigLoader::load() {
        Ok(config) => {
            let log_config = LogConfig::from(&config.logging);
            let logger = LoggerImpl::init(&log_config).ok();
            if let Some(ref dir) = log_config.log_dir {
                if let Err(e) = prune_old_logs(dir, log_config.retention_days).await {
                    tracing::warn!(error = %e, "log cleanup failed");
                }
            }
            logger
        }
        Err(_) => {
            tracing_subscriber::registry()
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
            None
        }
    };

    let result = match cli.command {
        Commands::Init(args) => advisor_cache::cli::commands::init::execute(args, cli.json).await,
        Commands::Cache(args) => advisor_cache::cli::commands::cache::execute(args, cli.json).await,
        Commands::Advisor(args) => advisor_cache::cli::commands::advisor::execute(args, cli.json).await,
        Commands::Batch(args) => advisor_cache::cli::commands::batch::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        advisor_cache::cli::handle_error(err, cli.json);
    }
}
