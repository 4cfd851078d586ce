mod collaborators;
mod config;
mod logging;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;

use adoption::AdoptionLocalClient;
use adoption::domain::service::AdoptionService;
use adoption::infra::{InMemoryStore, in_memory_repositories};
use adoption_sdk::AdoptionApi;
use anyhow::Result;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::collaborators::{BaseUrlFileResolver, OpenPetCatalog};
use crate::config::AppConfig;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Adoption Server - breeder and adopter marketplace engine
#[derive(Parser)]
#[command(name = "adoption-server")]
#[command(about = "Adoption Server - application ledger, moderation and consistency engine")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.config.as_deref() {
        if !path.is_file() {
            anyhow::bail!("config file does not exist: {}", path.display());
        }
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_verbosity(cli.verbose);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    logging::init(&config.logging)?;
    tracing::info!("Adoption Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(&config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

/// Wires the engine over the in-memory store.
fn build_client(config: &AppConfig) -> Arc<dyn AdoptionApi> {
    let store = Arc::new(InMemoryStore::new());
    let service = AdoptionService::new(
        in_memory_repositories(&store),
        Arc::new(OpenPetCatalog),
        Arc::new(BaseUrlFileResolver::new(&config.files.base_url)),
        config.adoption.clone(),
    );
    Arc::new(AdoptionLocalClient::new(Arc::new(service)))
}

/// Hosts the engine until a shutdown signal arrives.
///
/// No network transport ships with this binary. A transport embedding the
/// engine is handed `client` and serves every request through it.
async fn run_server(config: &AppConfig) -> Result<()> {
    let client = build_client(config);
    tracing::info!(
        enforce_unique_pending = config.adoption.enforce_unique_pending,
        files_base_url = %config.files.base_url,
        "Adoption engine ready"
    );

    shutdown::wait_for_shutdown().await?;

    // Handles held by a transport outlive this one; the engine stops with the last.
    drop(client);
    tracing::info!("Adoption Server stopped");
    Ok(())
}
