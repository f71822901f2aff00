//! edge-tunnel Agent Daemon
//!
//! Validates the node identity, resolves the port forwarding table from the
//! cluster configuration record and publishes it for the tunnel dialer.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use et_agent::{build_table, AgentOptions, ForwardingTableHandle, RecordWatcher};
use et_core::config::CredentialSource;

#[tokio::main]
async fn main() -> Result<()> {
    let opts = AgentOptions::parse();

    // Initialize logging; stdout is reserved for --print-table output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| opts.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    opts.validate().context("Invalid agent options")?;
    let config = opts.config().context("Failed to build agent config")?;
    let listeners = opts
        .listeners()
        .context("Invalid tunnel listener address")?;

    let table = build_table(opts.config_record.as_deref(), &listeners)
        .context("Failed to resolve proxy ports")?;

    if opts.print_table {
        println!("{}", serde_json::to_string(&table)?);
        return Ok(());
    }

    tracing::info!(
        "edge-tunnel agent starting on node {} ({})",
        config.node_name,
        config.node_ip
    );
    match &config.credentials {
        CredentialSource::KubeConfig(path) => {
            tracing::info!("create the clientset based on the kubeconfig({:?})", path)
        }
        CredentialSource::ApiServer(addr) => {
            tracing::info!("create the clientset based on the apiserver address({})", addr)
        }
    }
    if let Some(addr) = &config.tunnel_server_addr {
        tracing::info!("Tunnel server address: {}", addr);
    }
    for (port, dst) in table.iter() {
        tracing::info!("Forwarding port {} to {}", port, dst);
    }

    let handle = ForwardingTableHandle::new(table);
    let cancel = CancellationToken::new();

    // Setup signal handlers
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }

        cancel_clone.cancel();
    });

    let watcher = match (&opts.config_record, opts.reload_interval) {
        (Some(path), secs) if secs > 0 => {
            tracing::info!("Reloading {:?} every {}s", path, secs);
            let watcher = RecordWatcher::new(
                path.clone(),
                listeners,
                handle.clone(),
                Duration::from_secs(secs),
            );
            Some(tokio::spawn(watcher.run(cancel.clone())))
        }
        _ => None,
    };

    tracing::info!(
        "Forwarding table published with {} port(s), waiting for shutdown",
        handle.load().len()
    );
    cancel.cancelled().await;

    if let Some(watcher) = watcher {
        if let Err(e) = watcher.await {
            tracing::warn!("Record watcher task failed: {}", e);
        }
    }

    tracing::info!("edge-tunnel agent stopped");
    Ok(())
}
