//! Shared handle to the published forwarding table
//!
//! The dialer reads snapshots while the reload loop swaps in freshly
//! resolved tables. A snapshot is never mutated after it is published.

use std::sync::Arc;

use arc_swap::ArcSwap;

use et_core::types::PortForwardingTable;

/// Cloneable handle to the current forwarding table
#[derive(Debug, Clone)]
pub struct ForwardingTableHandle {
    current: Arc<ArcSwap<PortForwardingTable>>,
}

impl ForwardingTableHandle {
    /// Create a handle publishing `table`
    pub fn new(table: PortForwardingTable) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(table)),
        }
    }

    /// Current snapshot
    pub fn load(&self) -> Arc<PortForwardingTable> {
        self.current.load_full()
    }

    /// Publish a new table
    pub fn store(&self, table: PortForwardingTable) {
        self.current.store(Arc::new(table));
    }

    /// Publish `table` unless it equals the current one.
    ///
    /// Returns `true` when the table was swapped.
    pub fn replace_if_changed(&self, table: PortForwardingTable) -> bool {
        if **self.current.load() == table {
            return false;
        }
        self.store(table);
        true
    }
}

impl Default for ForwardingTableHandle {
    fn default() -> Self {
        Self::new(PortForwardingTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(u16, &str)]) -> PortForwardingTable {
        let mut table = PortForwardingTable::new();
        for (port, dst) in entries {
            table.insert(*port, dst).unwrap();
        }
        table
    }

    #[test]
    fn test_store_is_visible_to_clones() {
        let handle = ForwardingTableHandle::default();
        let reader = handle.clone();

        handle.store(table(&[(9100, "1.1.1.1:10264")]));
        assert_eq!(reader.load().destination(9100), Some("1.1.1.1:10264"));
    }

    #[test]
    fn test_old_snapshot_is_unchanged() {
        let handle = ForwardingTableHandle::new(table(&[(9100, "1.1.1.1:10264")]));
        let snapshot = handle.load();

        handle.store(table(&[(9200, "1.1.1.1:10263")]));
        assert_eq!(snapshot.ports(), [9100]);
        assert_eq!(handle.load().ports(), [9200]);
    }

    #[test]
    fn test_replace_if_changed() {
        let handle = ForwardingTableHandle::new(table(&[(9100, "1.1.1.1:10264")]));

        assert!(!handle.replace_if_changed(table(&[(9100, "1.1.1.1:10264")])));
        assert!(handle.replace_if_changed(table(&[(9100, "1.1.1.1:10263")])));
        assert_eq!(handle.load().destination(9100), Some("1.1.1.1:10263"));
    }
}
