use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use cafebook::client::{Backend, HttpBackend, LocalBackend, StateStore};
use cafebook::config::Config;
use cafebook::models::ProductType;
use cafebook::repo::open_repository;
use cafebook::service::CafeService;
use commands::{
    ConfigCommand, CostCommand, MaterialCommand, ProductCommand, ReportCommand, SaleCommand,
};

#[derive(Parser)]
#[command(name = "cafebook")]
#[command(version)]
#[command(about = "Inventory, recipe costing and sales for a small cafe", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage raw materials and stock
    Material(MaterialCommand),

    /// Manage drinks
    Drink(ProductCommand),

    /// Manage foods
    Food(ProductCommand),

    /// Record and review sales
    Sale(SaleCommand),

    /// Manage operational costs
    Cost(CostCommand),

    /// Sales and profit reports
    Report(ReportCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cafebook=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Talks to the configured server, or runs in-process on the local store.
async fn open_backend(config: &Config) -> Result<Arc<dyn Backend>, Box<dyn std::error::Error>> {
    if let Some(url) = &config.server_url.value {
        tracing::debug!(%url, "Using remote backend");
        return Ok(Arc::new(HttpBackend::new(url.clone())));
    }

    let repo = open_repository(config.storage.value, config.data_path.value.clone()).await?;
    let service = Arc::new(CafeService::new(repo));
    Ok(Arc::new(LocalBackend::new(service)))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let backend = open_backend(&config).await?;
    let mut store = StateStore::load(backend).await?;

    match command {
        Commands::Material(cmd) => cmd.run(&mut store).await,
        Commands::Drink(cmd) => cmd.run(ProductType::Drink, &mut store).await,
        Commands::Food(cmd) => cmd.run(ProductType::Food, &mut store).await,
        Commands::Sale(cmd) => cmd.run(&mut store).await,
        Commands::Cost(cmd) => cmd.run(&mut store).await,
        Commands::Report(cmd) => cmd.run(&store).await,
        Commands::Config(cmd) => cmd.run(&config),
    }
}
