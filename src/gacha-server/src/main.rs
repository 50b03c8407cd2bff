//! Gacha Simulator API Server

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gacha_server::{load_orchestrator, router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser)]
#[command(name = "gacha-server")]
#[command(about = "HTTP API server for the gacha simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,

        /// Directory holding gacha-items-<pool>.json catalogs
        #[arg(short, long, env = "GACHA_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Draw settings file (TOML). Without it, ./gacha.toml is used if present
        #[arg(short, long, env = "GACHA_SETTINGS")]
        settings: Option<PathBuf>,
    },

    /// Load catalogs and settings, report problems, and exit
    Check {
        #[arg(short, long, env = "GACHA_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        #[arg(short, long, env = "GACHA_SETTINGS")]
        settings: Option<PathBuf>,
    },
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gacha_server=info,gacha=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Serve {
            port,
            bind,
            data_dir,
            settings,
        } => {
            let gacha = load_orchestrator(&data_dir, settings.as_deref())?;
            let config = gacha.settings();
            tracing::info!(
                pools = ?gacha.list_pools(),
                pull_count = config.pull_count,
                pickup_count = config.pickup_count,
                guaranteed = %config.guaranteed_rarity,
                boost = ?config.boost,
                "Gacha pools loaded"
            );

            let app = router(Arc::new(AppState::new(gacha)));

            let bind_addr = format!("{}:{}", bind, port);
            tracing::info!("Starting server on {}", bind_addr);
            tracing::info!("OpenAPI spec available at /openapi.json");
            tracing::info!("Interactive docs at /scalar");

            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            axum::serve(listener, app).await?;
        }
        Command::Check { data_dir, settings } => {
            let gacha = load_orchestrator(&data_dir, settings.as_deref())?;
            for pool in gacha.registry().pools() {
                println!(
                    "{:<16} {:>4} items  total weight {}",
                    pool.name(),
                    pool.items().len(),
                    pool.table().total()
                );
            }
            println!("OK");
        }
    }

    Ok(())
}
