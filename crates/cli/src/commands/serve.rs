//! `serve` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::ServeArgs;
use crate::server::SyncServer;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;

    // Apply CLI overrides
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding server host from CLI");
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port, "Overriding server port from CLI");
        config.server.port = port;
    }
    if let Some(ref dir) = args.save_dir {
        config.server.save_dir = Some(dir.clone());
    }
    if let Some(port) = args.metrics_port {
        config.server.metrics_port = Some(port);
    }
    config_loader::ConfigLoader::validate(&config).context("Invalid server configuration")?;

    if let Some(port) = config.server.metrics_port {
        observability::init_metrics_only(port)?;
        info!("Metrics endpoint available on port {}", port);
    }

    let max_sessions = (args.max_sessions > 0).then_some(args.max_sessions);
    let server = SyncServer::bind(config).await?;
    info!(addr = %server.local_addr()?, "Listening for device uploads");

    tokio::select! {
        result = server.run(max_sessions) => {
            let stats = result.context("Sync server failed")?;
            stats.print_summary();
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping server...");
        }
    }

    info!("Gyro Syncer finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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
}
