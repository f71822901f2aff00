//! et-agent: edge-tunnel agent
//!
//! The agent validates its startup options, resolves the port forwarding
//! table from the cluster configuration record and publishes it for the
//! tunnel dialer, rebuilding it whenever the record changes.

pub mod options;
pub mod reload;
pub mod table;

pub use options::AgentOptions;
pub use reload::{build_table, RecordWatcher};
pub use table::ForwardingTableHandle;
