use anyhow::Context;
use clap::Parser;
use showcash::{
    api::routes::create_router,
    auth::SystemClock,
    utils::toml_config::{ConfigError, ShowcashConfig},
    AppState, TursoClient,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "showcash-server", version, about = "Showcash API server")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "SHOWCASH_CONFIG", default_value = "showcash.toml")]
    config: PathBuf,

    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let (mut config, from_file) = match ShowcashConfig::load(&cli.config) {
        Ok(config) => (config, true),
        Err(ConfigError::FileNotFound(_)) => (ShowcashConfig::default(), false),
        Err(e) => return Err(e).context("Failed to load configuration"),
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config.server.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "showcash-server starting");
    if !from_file {
        warn!(path = %cli.config.display(), "Configuration file not found, using defaults");
    }

    // Key material is loaded once; a missing or bad key aborts startup.
    let codec = config
        .auth
        .build_codec()
        .context("Failed to load session key material")?;
    info!(mode = ?config.auth.mode, carrier = ?config.auth.carrier, "Session codec ready");

    ensure_parent_dir(&config.database.url)?;
    let db = Arc::new(
        TursoClient::new_local(&config.database.url)
            .await
            .context("Failed to open database")?,
    );
    info!(url = %config.database.url, "Database opened");

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, db, codec, Arc::new(SystemClock));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on: {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(default_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_level.into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

fn ensure_parent_dir(database_url: &str) -> anyhow::Result<()> {
    if database_url == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(database_url).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, draining connections");
}
