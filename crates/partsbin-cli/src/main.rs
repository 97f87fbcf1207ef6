mod quick_add;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use partsbin_client::InventoryClient;
use tracing_subscriber::EnvFilter;

use crate::quick_add::QuickAddArgs;

#[derive(Debug, Parser)]
#[command(name = "partsbin")]
#[command(about = "Parts inventory command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look up candidate parts for a free-text description
    Search {
        /// Part number or description, e.g. "NE555" or "dual op-amp DIP-8"
        query: String,
    },
    /// List image suggestions for a free-text query
    Images {
        query: String,
    },
    /// Search, pick a candidate, confirm and create it with stock and images
    QuickAdd(QuickAddArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = partsbin_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let client = InventoryClient::from_config(&config)?;
    tracing::debug!(api_url = %client.base_url(), proxy_policy = %config.proxy_policy, "client ready");

    match cli.command {
        Commands::Search { query } => {
            let candidates = client.search_parts(query.trim()).await?;
            if candidates.is_empty() {
                println!("no parts found for \"{query}\"");
            }
            for (i, c) in candidates.iter().enumerate() {
                println!("{}", quick_add::describe_candidate(i + 1, c));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Images { query } => {
            // image search is enrichment; an error is reported but not fatal
            let suggestions = client.search_images(query.trim()).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "image search failed");
                Vec::new()
            });
            if suggestions.is_empty() {
                println!("no images found for \"{query}\"");
            }
            for (i, s) in suggestions.iter().enumerate() {
                println!(
                    "{:>2}. {}\n    display: {}",
                    i + 1,
                    s.url,
                    client.resolver().display_url(s)
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::QuickAdd(args) => quick_add::run(client, &config, args).await,
    }
}
