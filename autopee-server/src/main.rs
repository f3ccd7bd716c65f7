//! Autopee Wallet Server
//!
//! Receives SePay bank-transfer webhooks, matches them to users and payment
//! requests, and credits Autopee wallets.

mod api;
mod auth;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, LoadedConfig, get_database_url};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const USER_AGENT: &str = concat!("autopee-server/", env!("CARGO_PKG_VERSION"));

/// Autopee wallet server: SePay webhook receiver and deposit API
#[derive(Parser, Debug)]
#[command(name = "autopee-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "AUTOPEE_CONFIG", default_value = "./autopee-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Apply pending migrations from ./migrations before serving
    #[arg(long, default_value = "false")]
    migrate: bool,

    /// Maximum number of pooled database connections
    #[arg(long, env = "AUTOPEE_DB_CONNECTIONS", default_value = "10")]
    db_connections: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    tracing::info!("Starting autopee-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().inspect_err(|e| {
        tracing::error!(path = ?args.config, "Failed to load configuration: {}", e);
    })?;
    log_deposit_settings(&loaded_config);

    let listen_addr = loaded_config.server.listen;
    let shared_config = loaded_config.into_shared();

    let db_pool = connect_database(&args).await?;

    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(5))
        .build()?;

    let state = AppState::new(db_pool.clone(), shared_config, http);
    let reload_stop = spawn_config_reload_handler(state.clone(), config_loader);

    let result = run_server(build_router(state), listen_addr).await;

    reload_stop.notify_one();
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Open the pool and, with `--migrate`, bring the schema up to date.
async fn connect_database(args: &Args) -> anyhow::Result<PgPool> {
    let database_url = get_database_url().inspect_err(|_| {
        tracing::error!("DATABASE_URL environment variable not set");
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(args.db_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&database_url)
        .await
        .inspect_err(|e| tracing::error!("Failed to connect to database: {}", e))?;
    tracing::info!(max_connections = args.db_connections, "Database pool ready");

    if args.migrate {
        sqlx::migrate!("../migrations")
            .run(&pool)
            .await
            .inspect_err(|e| tracing::error!("Failed to run migrations: {}", e))?;
        tracing::info!("Migrations applied");
    }

    Ok(pool)
}

fn log_deposit_settings(config: &LoadedConfig) {
    tracing::info!(
        bank = %config.payment.bank_name,
        account = %config.payment.bank_account,
        prefix = %config.payment.code_prefix,
        min = %config.payment.min_amount,
        max = %config.payment.max_amount,
        expires_in_minutes = config.payment.expires_in.whole_minutes(),
        firebase_project = %config.firebase.project_id,
        "Deposit settings loaded"
    );
    if config.sepay.api_key.is_none() {
        tracing::warn!("sepay.api_key is not set; webhook deliveries are accepted unauthenticated");
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
