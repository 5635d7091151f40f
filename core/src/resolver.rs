//! # Port Resolution
//!
//! Turns "who is asking" plus a logical port into the host port the container
//! runtime publishes it on.
//!
//! Matching strategy per identity:
//! 1. **Hostname + IP + MAC**: the hostname is first tried as a container
//!    identifier (fast path). Only an unknown identifier falls through to a
//!    full listing, where the first container matching all three fields wins.
//!    A transport error on the fast path is final.
//! 2. **Source IP**: full listing only, first container with that IP wins.
//!
//! Listing order is whatever the backend returns and is not stable across
//! calls, so duplicate identities resolve nondeterministically.

use std::sync::Arc;

use dockport_common::container::{ContainerRecord, IdentityQuery, PortQuery, Resolution};
use tracing::{Instrument, Span, debug, info_span, warn};

use crate::inventory::{ContainerInventory, InventoryError};

pub struct PortResolver {
    inventory: Arc<dyn ContainerInventory>,
    span: Span,
}

impl PortResolver {
    pub fn new(inventory: Arc<dyn ContainerInventory>, span: Span) -> Self {
        Self { inventory, span }
    }

    pub async fn resolve(&self, identity: &IdentityQuery, port: PortQuery) -> Resolution {
        let span = info_span!(parent: &self.span, "resolve", %identity, %port);
        async {
            match identity {
                IdentityQuery::ByHostnameAndTriple { hostname, ip, mac } => {
                    self.resolve_triple(hostname, ip, mac, port).await
                }
                IdentityQuery::BySourceIp { ip } => {
                    self.scan(|record| record.matches_ip(*ip), port).await
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn resolve_triple(&self, hostname: &str, ip: &str, mac: &str, port: PortQuery) -> Resolution {
        match self.inventory.inspect(hostname).await {
            Ok(record) => return extract_port(&record, port),
            Err(InventoryError::NotFound(_)) => {
                debug!("hostname is not a container identifier, scanning inventory");
            }
            Err(err) => return Resolution::Failed(err),
        }
        self.scan(|record| record.matches_triple(hostname, ip, mac), port)
            .await
    }

    async fn scan(&self, matches: impl Fn(&ContainerRecord) -> bool, port: PortQuery) -> Resolution {
        let records = match self.inventory.list_and_inspect_all().await {
            Ok(records) => records,
            Err(err) => return Resolution::Failed(err),
        };
        records
            .iter()
            .find(|record| matches(record))
            .map(|record| extract_port(record, port))
            .unwrap_or(Resolution::NotFound)
    }
}

/// The container is known at this point, so a missing key is `NotExposed`.
pub fn extract_port(record: &ContainerRecord, port: PortQuery) -> Resolution {
    match record.host_port(&port) {
        Some(host_port) => Resolution::Resolved(host_port),
        None => {
            warn!(hostname = %record.hostname, %port, "the port is not exposed");
            Resolution::NotExposed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::StaticInventory;
    use std::net::{IpAddr, Ipv4Addr};

    const MAC: &str = "aa:bb:cc:dd:ee:ff";

    fn web() -> ContainerRecord {
        ContainerRecord::new("web", "192.168.1.10", MAC)
            .with_port(PortQuery::tcp(80), 32768)
            .with_port(PortQuery::udp(8125), 32769)
    }

    fn triple(hostname: &str, ip: &str, mac: &str) -> IdentityQuery {
        IdentityQuery::ByHostnameAndTriple {
            hostname: hostname.to_string(),
            ip: ip.to_string(),
            mac: mac.to_string(),
        }
    }

    fn resolver(inventory: Arc<StaticInventory>) -> PortResolver {
        PortResolver::new(inventory, Span::none())
    }

    #[tokio::test]
    async fn fast_path_resolves_without_listing() {
        let inventory = Arc::new(StaticInventory::new().with_container("web", web()));
        let resolution = resolver(inventory.clone())
            .resolve(&triple("web", "wrong", "wrong"), PortQuery::tcp(80))
            .await;
        assert_eq!(resolution, Resolution::Resolved(32768));
        assert_eq!(inventory.list_calls(), 0);
    }

    #[tokio::test]
    async fn fast_path_hit_without_port_does_not_fall_through() {
        let other = ContainerRecord::new("web", "192.168.1.10", MAC).with_port(PortQuery::tcp(443), 40000);
        let inventory = Arc::new(
            StaticInventory::new()
                .with_container("web", web())
                .with_container("abc123", other),
        );
        let resolution = resolver(inventory.clone())
            .resolve(&triple("web", "192.168.1.10", MAC), PortQuery::tcp(443))
            .await;
        assert_eq!(resolution, Resolution::NotExposed);
        assert_eq!(inventory.list_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_identifier_scans_for_triple() {
        let inventory = Arc::new(StaticInventory::new().with_container("3f4e5d", web()));
        let resolution = resolver(inventory.clone())
            .resolve(&triple("web", "192.168.1.10", MAC), PortQuery::udp(8125))
            .await;
        assert_eq!(resolution, Resolution::Resolved(32769));
        assert_eq!(inventory.list_calls(), 1);
    }

    #[tokio::test]
    async fn scan_requires_all_three_fields() {
        let inventory = Arc::new(StaticInventory::new().with_container("3f4e5d", web()));
        let resolver = resolver(inventory);
        for identity in [
            triple("web", "192.168.1.11", MAC),
            triple("web", "192.168.1.10", "00:00:00:00:00:00"),
            triple("ghost", "192.168.1.10", MAC),
        ] {
            assert_eq!(resolver.resolve(&identity, PortQuery::tcp(80)).await, Resolution::NotFound);
        }
    }

    #[tokio::test]
    async fn first_match_in_listing_order_wins() {
        let second = ContainerRecord::new("web", "192.168.1.10", MAC).with_port(PortQuery::tcp(80), 40000);
        let inventory = Arc::new(
            StaticInventory::new()
                .with_container("first", web())
                .with_container("second", second),
        );
        let resolution = resolver(inventory)
            .resolve(&triple("web", "192.168.1.10", MAC), PortQuery::tcp(80))
            .await;
        assert_eq!(resolution, Resolution::Resolved(32768));
    }

    #[tokio::test]
    async fn udp_query_never_matches_tcp_key() {
        let record = ContainerRecord::new("statsd", "192.168.1.20", MAC).with_port(PortQuery::tcp(8125), 31000);
        let inventory = Arc::new(StaticInventory::new().with_container("statsd", record));
        let resolution = resolver(inventory)
            .resolve(&triple("statsd", "192.168.1.20", MAC), "8125/udp".parse().unwrap())
            .await;
        assert_eq!(resolution, Resolution::NotExposed);
    }

    #[tokio::test]
    async fn transport_error_on_fast_path_is_final() {
        let inventory = Arc::new(
            StaticInventory::new()
                .with_container("3f4e5d", web())
                .with_inspect_error(InventoryError::Transport("connection refused".to_string())),
        );
        let resolution = resolver(inventory.clone())
            .resolve(&triple("web", "192.168.1.10", MAC), PortQuery::tcp(80))
            .await;
        assert!(matches!(resolution, Resolution::Failed(InventoryError::Transport(_))));
        assert_eq!(inventory.list_calls(), 0);
    }

    #[tokio::test]
    async fn listing_error_is_failed() {
        let inventory = Arc::new(
            StaticInventory::new().with_list_error(InventoryError::Transport("socket closed".to_string())),
        );
        let resolution = resolver(inventory)
            .resolve(&triple("web", "192.168.1.10", MAC), PortQuery::tcp(80))
            .await;
        assert!(matches!(resolution, Resolution::Failed(_)));
    }

    #[tokio::test]
    async fn source_ip_skips_fast_path() {
        let inventory = Arc::new(
            StaticInventory::new()
                .with_container("3f4e5d", web())
                .with_inspect_error(InventoryError::Transport("must not be called".to_string())),
        );
        let resolver = resolver(inventory.clone());
        let identity = IdentityQuery::BySourceIp {
            ip: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)),
        };
        assert_eq!(resolver.resolve(&identity, PortQuery::tcp(80)).await, Resolution::Resolved(32768));

        let stranger = IdentityQuery::BySourceIp {
            ip: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 99)),
        };
        assert_eq!(resolver.resolve(&stranger, PortQuery::tcp(80)).await, Resolution::NotFound);
        assert_eq!(inventory.list_calls(), 2);
    }
}
