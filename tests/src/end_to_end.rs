use std::fs;
use std::time::Duration;

use dockport_common::config::{IdentityMode, WatchConfig};
use dockport_common::container::{ContainerRecord, PortQuery, Resolution};
use dockport_common::network::host_info::{self, HostInfo};
use dockport_core::client::{ClientError, RemoteLookupClient};
use dockport_core::inventory::StaticInventory;
use dockport_core::registry::ServiceWatcher;
use pnet::datalink::MacAddr;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::util::{RunningServer, ni, v4};

const CONTAINER_MAC: MacAddr = MacAddr(0x02, 0x42, 0xac, 0x11, 0x00, 0x02);

fn web_container() -> ContainerRecord {
    ContainerRecord::new("web-1", "172.17.0.2", CONTAINER_MAC.to_string())
        .with_port(PortQuery::tcp(80), 32768)
        .with_port(PortQuery::udp(8125), 41000)
}

/// The identity the container would send from inside its own namespace.
fn web_identity() -> HostInfo {
    let eth0 = ni("eth0", 2, Some(CONTAINER_MAC), &[v4(172, 17, 0, 2, 16)], 0);
    host_info::from_interface("web-1".to_string(), &eth0).unwrap()
}

/// Registry entry `lookup` names the lookup server; the watcher's pre-hook
/// hands its address to the client, which then resolves the container's ports.
#[tokio::test]
async fn registry_address_feeds_remote_lookup() {
    let server = RunningServer::start(
        StaticInventory::new().with_container("web-1", web_container()),
        IdentityMode::Remote,
    )
    .await;

    let registry = tempfile::tempdir().unwrap();
    fs::write(registry.path().join("lookup"), format!("{}\n", server.addr)).unwrap();

    let (tx, mut addresses) = mpsc::unbounded_channel();
    let stop = CancellationToken::new();
    let watcher = ServiceWatcher::new(
        WatchConfig::new("lookup", registry.path()).with_interval(Duration::from_secs(3600)),
        move |address: Option<&str>| {
            let _ = tx.send(address.map(str::to_string));
        },
        stop.clone(),
        Span::none(),
    )
    .unwrap()
    .spawn();

    let address = timeout(Duration::from_secs(5), addresses.recv())
        .await
        .unwrap()
        .unwrap()
        .expect("registry entry should be readable");
    assert_eq!(address, server.addr.to_string());

    let client = RemoteLookupClient::new(format!("http://{address}/"), Span::none());
    let identity = web_identity();

    assert_eq!(client.lookup(&identity, "80").await.unwrap(), Resolution::Resolved(32768));
    assert_eq!(client.lookup(&identity, "80/tcp").await.unwrap(), Resolution::Resolved(32768));
    assert_eq!(client.lookup(&identity, "8125/udp").await.unwrap(), Resolution::Resolved(41000));
    assert_eq!(client.lookup(&identity, "443").await.unwrap(), Resolution::NotExposed);
    assert_eq!(client.lookup(&identity, "8125").await.unwrap(), Resolution::NotExposed);

    let ghost = HostInfo {
        hostname: "ghost".to_string(),
        ..identity.clone()
    };
    match client.lookup(&ghost, "80").await.unwrap_err() {
        ClientError::UnexpectedStatus { status, .. } => assert_eq!(status, 404),
        other => panic!("expected a 404, got {other:?}"),
    }

    match client.lookup(&identity, "http").await.unwrap_err() {
        ClientError::UnexpectedStatus { status, .. } => assert_eq!(status, 400),
        other => panic!("expected a 400, got {other:?}"),
    }

    stop.cancel();
    watcher.await.unwrap();
    server.shutdown().await;
}

/// With the identity taken from the connection, the body needs only the port.
#[tokio::test]
async fn source_ip_mode_resolves_loopback_caller() {
    let record = ContainerRecord::new("web-1", "127.0.0.1", CONTAINER_MAC.to_string())
        .with_port(PortQuery::tcp(80), 32768);
    let server = RunningServer::start(
        StaticInventory::new().with_container("web-1", record),
        IdentityMode::SourceIp,
    )
    .await;

    let client = RemoteLookupClient::new(format!("http://{}/", server.addr), Span::none());
    assert_eq!(client.lookup_port_only("80").await.unwrap(), Resolution::Resolved(32768));
    assert_eq!(client.lookup_port_only("53/udp").await.unwrap(), Resolution::NotExposed);

    // Body identity is ignored: a foreign hostname still resolves as the caller.
    let stranger = HostInfo {
        hostname: "somebody-else".to_string(),
        ip: "10.9.9.9".to_string(),
        mac: String::new(),
    };
    assert_eq!(client.lookup(&stranger, "80").await.unwrap(), Resolution::Resolved(32768));

    server.shutdown().await;
}

#[tokio::test]
async fn source_ip_mode_unknown_caller_is_not_found() {
    let server = RunningServer::start(
        StaticInventory::new().with_container("web-1", web_container()),
        IdentityMode::SourceIp,
    )
    .await;

    let client = RemoteLookupClient::new(format!("http://{}/", server.addr), Span::none());
    match client.lookup_port_only("80").await.unwrap_err() {
        ClientError::UnexpectedStatus { status, .. } => assert_eq!(status, 404),
        other => panic!("expected a 404, got {other:?}"),
    }

    server.shutdown().await;
}
