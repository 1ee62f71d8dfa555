//! rates-api - daily average freight rates service
//!
//! Subcommands:
//! - `serve` (default): read-only HTTP API on the configured address
//! - `migrate`: create or upgrade the database schema
//! - `rebuild-codes`: regenerate the region → port lookup after loading
//!   new regions or ports
//! - `resolve <KEY>`: print the port codes a port code or region slug covers

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rates_api::{build_router, AppState};
use rates_common::config::{ConfigOverrides, ServiceConfig};
use rates_common::db::{connect_readonly, init_database, rebuild_codes_table, resolve};
use tokio::signal;
use tracing::{error, info};

/// Command-line arguments for rates-api
#[derive(Parser, Debug)]
#[command(name = "rates-api")]
#[command(about = "Daily average freight rates between ports and regions")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/rates/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Bound on each aggregate query, in milliseconds
        #[arg(long)]
        query_timeout_ms: Option<u64>,
    },
    /// Create or upgrade the database schema
    Migrate,
    /// Rebuild the codes lookup from the regions and ports tables
    RebuildCodes,
    /// Print the port codes a port code or region slug resolves to
    Resolve {
        /// Port code or region slug
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rates_api=info,rates_common=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting rates-api v{}", env!("CARGO_PKG_VERSION"));

    let mut overrides = ConfigOverrides {
        config_file: args.config,
        database_path: args.database,
        ..Default::default()
    };

    let command = args.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
        query_timeout_ms: None,
    });

    if let Command::Serve {
        host,
        port,
        query_timeout_ms,
    } = &command
    {
        overrides.host = host.clone();
        overrides.port = *port;
        overrides.query_timeout_ms = *query_timeout_ms;
    }

    let config = ServiceConfig::resolve(overrides).context("Failed to resolve configuration")?;
    info!("Database path: {}", config.database_path.display());

    match command {
        Command::Serve { .. } => serve(config).await,
        Command::Migrate => {
            let pool = init_database(&config.database_path)
                .await
                .context("Failed to initialize database")?;
            pool.close().await;
            info!("✓ Database schema ready");
            Ok(())
        }
        Command::RebuildCodes => {
            let pool = init_database(&config.database_path)
                .await
                .context("Failed to initialize database")?;
            let rows = rebuild_codes_table(&pool)
                .await
                .context("Failed to rebuild codes table")?;
            pool.close().await;
            info!("✓ Codes table rebuilt ({} rows)", rows);
            Ok(())
        }
        Command::Resolve { key } => {
            let pool = connect_readonly(&config.database_path).await?;
            let codes = resolve(&pool, key.trim())
                .await
                .context("Failed to read codes table")?;
            if codes.is_empty() {
                info!("'{}' resolves to no port codes", key.trim());
            }
            for code in codes {
                println!("{}", code);
            }
            Ok(())
        }
    }
}

async fn serve(config: ServiceConfig) -> Result<()> {
    let pool = match connect_readonly(&config.database_path).await {
        Ok(pool) => {
            info!("✓ Connected to database (read-only)");
            pool
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    let query_timeout = config.query_timeout_ms.map(Duration::from_millis);
    if let Some(limit) = query_timeout {
        info!("Aggregate query timeout: {} ms", limit.as_millis());
    }

    let app = build_router(AppState::new(pool, query_timeout));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;
    info!("rates-api listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
