//! Configuration record reloading

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use et_core::config::{self, ConfigRecord};
use et_core::error::EtError;
use et_core::ports::resolve_proxy_ports;
use et_core::types::{ListenerAddrs, PortForwardingTable};

use crate::table::ForwardingTableHandle;

/// Load the record at `path` (if any) and resolve the forwarding table
pub fn build_table(
    path: Option<&Path>,
    listeners: &ListenerAddrs,
) -> Result<PortForwardingTable, EtError> {
    let record = match path {
        Some(path) => config::load_record(path)?,
        None => {
            tracing::warn!("No configuration record given, no ports will be forwarded");
            ConfigRecord::new()
        }
    };

    Ok(resolve_proxy_ports(&record, listeners)?)
}

/// Periodically re-resolves the record and swaps the published table
pub struct RecordWatcher {
    path: PathBuf,
    listeners: ListenerAddrs,
    handle: ForwardingTableHandle,
    interval: Duration,
}

impl RecordWatcher {
    pub fn new(
        path: PathBuf,
        listeners: ListenerAddrs,
        handle: ForwardingTableHandle,
        interval: Duration,
    ) -> Self {
        Self {
            path,
            listeners,
            handle,
            interval,
        }
    }

    /// Re-resolve once, returning whether the published table changed.
    ///
    /// On error the previous table stays in effect.
    pub fn reload(&self) -> Result<bool, EtError> {
        let table = build_table(Some(&self.path), &self.listeners)?;
        let changed = self.handle.replace_if_changed(table);
        if changed {
            tracing::info!(
                "Forwarding table updated: {}",
                self.handle.load()
            );
        }
        Ok(changed)
    }

    /// Reload on every tick until cancelled
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately; the table was built at startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Record watcher stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.reload() {
                        tracing::warn!(
                            "Failed to reload {:?}, keeping previous forwarding table: {}",
                            self.path,
                            e
                        );
                    }
                }
            }
        }
    }
}
