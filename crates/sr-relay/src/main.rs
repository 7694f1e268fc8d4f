//! shell-relay daemon
//!
//! Serves the browser console over HTTP and WebSocket and relays its
//! commands to one shared SSH session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sr_core::config::{self, RelayConfig};
use sr_core::error::ConfigError;
use sr_relay::server::RelayServer;
use sr_relay::session::run_liveness_monitor;
use sr_relay::ssh::SshConnector;
use sr_relay::RelayState;

#[derive(Parser)]
#[command(name = "sr-relay")]
#[command(about = "Relay browser console commands to a shared SSH session")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:3000
    #[arg(short, long)]
    bind: Option<String>,

    /// Listen port; replaces the port of the bind address
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Debug logging regardless of --log-level
    #[arg(short, long)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(args: &Args) {
    let level = if args.verbose { "debug" } else { args.log_level.as_str() };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// An explicit path must load; the default path is optional
fn load_relay_config(explicit: Option<&Path>) -> Result<RelayConfig> {
    if let Some(path) = explicit {
        return config::load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let path = config::default_config_path();
    match config::load_config(&path) {
        Ok(config) => {
            tracing::info!("Loaded config from {}", path.display());
            Ok(config)
        }
        Err(ConfigError::NotFound(_)) => {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(RelayConfig::default())
        }
        Err(e) => {
            tracing::warn!("Ignoring config at {}: {}", path.display(), e);
            Ok(RelayConfig::default())
        }
    }
}

/// Cancel `cancel` on Ctrl+C or SIGTERM
async fn watch_signals(cancel: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
    cancel.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let mut config = load_relay_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(port) = args.port {
        config = config.with_port(port);
    }

    tracing::info!(
        "shell-relay {} starting (detach policy: {:?}, aliases: {})",
        env!("CARGO_PKG_VERSION"),
        config.detach_policy,
        if config.translate_aliases { "on" } else { "off" }
    );

    let bind_addr = config.bind_address.clone();
    let liveness_interval = config.liveness_interval;
    let connector = Arc::new(SshConnector::new(config.host_key_fingerprint.clone()));
    let state = Arc::new(RelayState::new(config, connector));

    let cancel = CancellationToken::new();
    tokio::spawn(watch_signals(cancel.clone()));
    tokio::spawn(run_liveness_monitor(
        Arc::clone(&state.sessions),
        liveness_interval,
        cancel.clone(),
    ));

    let served = RelayServer::new(Arc::clone(&state), cancel.clone())
        .run(&bind_addr)
        .await;

    cancel.cancel();
    state.sessions.teardown();
    served?;

    tracing::info!("shell-relay stopped");
    Ok(())
}
