use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shadowboard::client::VaultClient;
use shadowboard::vault::{Vault, VaultConfig};
use shadowboard::{api, db};

/// Default port for the local API.
const DEFAULT_PORT: u16 = 17020;

#[derive(Parser)]
#[command(name = "shadowboard")]
#[command(about = "Encrypted local vault for the ShadowBoard planning dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the local API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Database file (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Show the lock state of a running server
    Status,
    /// Lock a running server
    Lock,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "shadowboard=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(port: u16, db_path: Option<PathBuf>) -> anyhow::Result<()> {
    let db = match db_path {
        Some(path) => db::Database::open(path)?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    let vault = Vault::open(db, VaultConfig::from_env())?;
    let app = api::create_router_with_config(vault.clone(), api::SecurityConfig::from_env());

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("ShadowBoard listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    vault.shutdown().await;
    tracing::info!("ShadowBoard stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { port, db }) => serve(port, db).await?,
        Some(Commands::Status) => {
            let client = VaultClient::from_env();
            let status = client.status().await?;
            println!(
                "{}: {} (undo {}, redo {})",
                client.base_url(),
                status.state,
                status.undo,
                status.redo
            );
        }
        Some(Commands::Lock) => {
            let status = VaultClient::from_env().lock().await?;
            println!("Vault is {}", status.state);
        }
        None => serve(DEFAULT_PORT, None).await?,
    }

    Ok(())
}
