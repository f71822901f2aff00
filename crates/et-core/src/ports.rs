//! Proxy port resolution
//!
//! Three record keys describe which ports the agent forwards:
//!
//! - `dnat-ports-pair`: `src=target` pairs where `target` names one of the
//!   two listener ports
//! - `http-proxy-ports`: ports forwarded to the insecure listener
//! - `https-proxy-ports`: ports forwarded to the secure listener
//!
//! They are folded, in that order, into a single [`PortForwardingTable`].

use crate::config::ConfigRecord;
use crate::error::ResolveError;
use crate::types::{ListenerAddrs, PortForwardingTable};

/// Record key holding `src=target` port pairs
pub const DNAT_PORTS_PAIR_KEY: &str = "dnat-ports-pair";

/// Record key holding ports forwarded to the insecure listener
pub const HTTP_PROXY_PORTS_KEY: &str = "http-proxy-ports";

/// Record key holding ports forwarded to the secure listener
pub const HTTPS_PROXY_PORTS_KEY: &str = "https-proxy-ports";

/// Build the forwarding table from a configuration record.
///
/// Within one key a repeated port takes the later destination. Across keys a
/// port must keep the same destination. Fails on the first malformed entry;
/// no partial table is returned.
pub fn resolve_proxy_ports(
    record: &ConfigRecord,
    listeners: &ListenerAddrs,
) -> Result<PortForwardingTable, ResolveError> {
    let mut table = PortForwardingTable::new();

    if let Some(pairs) = record.get(DNAT_PORTS_PAIR_KEY).filter(|v| !v.trim().is_empty()) {
        let mut dnat = PortForwardingTable::new();
        // Empty pairs are kept so they fail the srcPort=targetPort check.
        for pair in pairs.split(',').map(str::trim) {
            let (source, destination) = resolve_dnat_pair(pair, listeners)?;
            dnat.overwrite(source, destination);
        }
        table.merge(&dnat)?;
    }

    for (key, destination) in [
        (HTTP_PROXY_PORTS_KEY, listeners.insecure()),
        (HTTPS_PROXY_PORTS_KEY, listeners.secure()),
    ] {
        let Some(ports) = record.get(key) else {
            continue;
        };
        let mut proxied = PortForwardingTable::new();
        for port in list_entries(ports) {
            proxied.overwrite(parse_port(key, port)?, destination);
        }
        table.merge(&proxied)?;
    }

    tracing::debug!(ports = table.len(), "Resolved proxy ports: {}", table);
    Ok(table)
}

/// Trimmed, non-empty entries of a comma-separated port list
fn list_entries(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn resolve_dnat_pair<'a>(
    pair: &str,
    listeners: &'a ListenerAddrs,
) -> Result<(u16, &'a str), ResolveError> {
    let parts: Vec<&str> = pair.split('=').map(str::trim).collect();
    let [source, target] = parts.as_slice() else {
        return Err(format_error(
            DNAT_PORTS_PAIR_KEY,
            pair,
            "expected srcPort=targetPort",
        ));
    };

    let source = parse_port(DNAT_PORTS_PAIR_KEY, source)?;
    let target = parse_port(DNAT_PORTS_PAIR_KEY, target)?;

    let destination = listeners
        .by_port(target)
        .ok_or_else(|| ResolveError::UnresolvedTarget {
            source_port: source,
            target,
            insecure: listeners.insecure().to_string(),
            secure: listeners.secure().to_string(),
        })?;

    Ok((source, destination))
}

/// Parse a decimal port, rejecting signs and leading zeros so the value
/// round-trips to the configured string
fn parse_port(key: &'static str, value: &str) -> Result<u16, ResolveError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format_error(key, value, "port must be a decimal number"));
    }
    if value.starts_with('0') {
        return Err(format_error(
            key,
            value,
            "port must be between 1 and 65535 without leading zeros",
        ));
    }
    value
        .parse::<u16>()
        .map_err(|e| format_error(key, value, &e.to_string()))
}

fn format_error(key: &'static str, entry: &str, reason: &str) -> ResolveError {
    ResolveError::Format {
        key,
        entry: entry.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSECURE_LISTEN_ADDR: &str = "1.1.1.1:10264";
    const SECURE_LISTEN_ADDR: &str = "1.1.1.1:10263";

    fn listeners() -> ListenerAddrs {
        ListenerAddrs::new(INSECURE_LISTEN_ADDR, SECURE_LISTEN_ADDR).unwrap()
    }

    fn record(entries: &[(&str, &str)]) -> ConfigRecord {
        entries.iter().copied().collect()
    }

    fn sorted_ports(table: &PortForwardingTable) -> Vec<u16> {
        let mut ports = table.ports().to_vec();
        ports.sort_unstable();
        ports
    }

    #[test]
    fn test_dnat_ports_pair() {
        let table = resolve_proxy_ports(&record(&[("dnat-ports-pair", "9100=10264")]), &listeners())
            .unwrap();

        assert_eq!(table.ports(), [9100]);
        assert_eq!(table.destination(9100), Some(INSECURE_LISTEN_ADDR));
        assert_eq!(table.mappings().len(), 1);
    }

    #[test]
    fn test_dnat_to_secure_listener() {
        let table = resolve_proxy_ports(
            &record(&[("dnat-ports-pair", "9100=10264, 9443=10263")]),
            &listeners(),
        )
        .unwrap();

        assert_eq!(table.ports(), [9100, 9443]);
        assert_eq!(table.destination(9443), Some(SECURE_LISTEN_ADDR));
    }

    #[test]
    fn test_http_proxy_ports() {
        let table =
            resolve_proxy_ports(&record(&[("http-proxy-ports", "9100,9200")]), &listeners()).unwrap();

        assert_eq!(sorted_ports(&table), [9100, 9200]);
        assert_eq!(table.destination(9100), Some(INSECURE_LISTEN_ADDR));
        assert_eq!(table.destination(9200), Some(INSECURE_LISTEN_ADDR));
    }

    #[test]
    fn test_https_proxy_ports() {
        let table =
            resolve_proxy_ports(&record(&[("https-proxy-ports", "9100,9200")]), &listeners()).unwrap();

        assert_eq!(sorted_ports(&table), [9100, 9200]);
        assert_eq!(table.destination(9100), Some(SECURE_LISTEN_ADDR));
        assert_eq!(table.destination(9200), Some(SECURE_LISTEN_ADDR));
    }

    #[test]
    fn test_http_and_https_proxy_ports() {
        let table = resolve_proxy_ports(
            &record(&[
                ("http-proxy-ports", "9100,9200"),
                ("https-proxy-ports", "9300,9400"),
            ]),
            &listeners(),
        )
        .unwrap();

        assert_eq!(sorted_ports(&table), [9100, 9200, 9300, 9400]);
        assert_eq!(table.mappings().len(), 4);
        assert_eq!(table.destination(9200), Some(INSECURE_LISTEN_ADDR));
        assert_eq!(table.destination(9300), Some(SECURE_LISTEN_ADDR));
    }

    #[test]
    fn test_insertion_order_is_dnat_http_https() {
        let table = resolve_proxy_ports(
            &record(&[
                ("https-proxy-ports", "9300"),
                ("http-proxy-ports", "9200"),
                ("dnat-ports-pair", "9100=10263"),
            ]),
            &listeners(),
        )
        .unwrap();

        assert_eq!(table.ports(), [9100, 9200, 9300]);
    }

    #[test]
    fn test_missing_keys_yield_empty_table() {
        let table = resolve_proxy_ports(&record(&[("unrelated", "1")]), &listeners()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_list_entries_are_skipped() {
        let table =
            resolve_proxy_ports(&record(&[("http-proxy-ports", " 9100, ,9200,")]), &listeners())
                .unwrap();
        assert_eq!(table.ports(), [9100, 9200]);
    }

    #[test]
    fn test_dnat_unresolved_target() {
        let err = resolve_proxy_ports(&record(&[("dnat-ports-pair", "9100=8080")]), &listeners())
            .unwrap_err();

        assert!(matches!(
            err,
            ResolveError::UnresolvedTarget {
                source_port: 9100,
                target: 8080,
                ..
            }
        ));
    }

    #[test]
    fn test_dnat_malformed_pair() {
        for pair in [
            "9100",
            "9100=10264=1",
            "9100=abc",
            "abc=10264",
            "9100=10264,",
            ",",
            "9100=10264,,9200=10263",
        ] {
            let err = resolve_proxy_ports(&record(&[("dnat-ports-pair", pair)]), &listeners())
                .unwrap_err();
            assert!(
                matches!(err, ResolveError::Format { key: DNAT_PORTS_PAIR_KEY, .. }),
                "{} should be a format error, got {:?}",
                pair,
                err
            );
        }
    }

    #[test]
    fn test_invalid_proxy_port() {
        for port in ["http", "0", "70000", "+9100", "09100", "-1"] {
            let err = resolve_proxy_ports(&record(&[("https-proxy-ports", port)]), &listeners())
                .unwrap_err();
            assert!(matches!(err, ResolveError::Format { key: HTTPS_PROXY_PORTS_KEY, .. }));
        }
    }

    #[test]
    fn test_conflicting_destinations() {
        let err = resolve_proxy_ports(
            &record(&[
                ("http-proxy-ports", "9100"),
                ("https-proxy-ports", "9100"),
            ]),
            &listeners(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ResolveError::ConflictingMapping {
                port: 9100,
                existing: INSECURE_LISTEN_ADDR.to_string(),
                requested: SECURE_LISTEN_ADDR.to_string(),
            }
        );
    }

    #[test]
    fn test_same_destination_is_deduplicated() {
        let table = resolve_proxy_ports(
            &record(&[
                ("dnat-ports-pair", "9100=10264"),
                ("http-proxy-ports", "9100,9100"),
            ]),
            &listeners(),
        )
        .unwrap();

        assert_eq!(table.ports(), [9100]);
    }

    #[test]
    fn test_blank_dnat_value_is_absent() {
        let table =
            resolve_proxy_ports(&record(&[("dnat-ports-pair", "  ")]), &listeners()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_dnat_repeated_port_takes_last_destination() {
        let table = resolve_proxy_ports(
            &record(&[("dnat-ports-pair", "9100=10264,9200=10264,9100=10263")]),
            &listeners(),
        )
        .unwrap();

        assert_eq!(table.ports(), [9100, 9200]);
        assert_eq!(table.destination(9100), Some(SECURE_LISTEN_ADDR));
        assert_eq!(table.destination(9200), Some(INSECURE_LISTEN_ADDR));
    }

    #[test]
    fn test_dnat_overwrite_then_conflict_across_keys() {
        let err = resolve_proxy_ports(
            &record(&[
                ("dnat-ports-pair", "9100=10264,9100=10263"),
                ("http-proxy-ports", "9100"),
            ]),
            &listeners(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ResolveError::ConflictingMapping { port: 9100, .. }
        ));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let record = record(&[
            ("dnat-ports-pair", "9100=10264"),
            ("https-proxy-ports", "9300,9400"),
        ]);

        let first = resolve_proxy_ports(&record, &listeners()).unwrap();
        let second = resolve_proxy_ports(&record, &listeners()).unwrap();
        assert_eq!(first, second);
    }
}
