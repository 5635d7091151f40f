use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use dockport_common::config::IdentityMode;
use dockport_core::inventory::ContainerInventory;
use dockport_core::resolver::PortResolver;
use dockport_core::server::{self, LookupServer};
use pnet::datalink::{MacAddr, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Span;

pub fn ni(name: &str, index: u32, mac: Option<MacAddr>, ips: &[IpNetwork], flags: u32) -> NetworkInterface {
    NetworkInterface {
        name: name.into(),
        description: "".into(),
        index,
        mac,
        ips: ips.to_vec(),
        flags,
    }
}

pub fn v4(a: u8, b: u8, c: u8, d: u8, p: u8) -> IpNetwork {
    IpNetwork::V4(Ipv4Network::new(Ipv4Addr::new(a, b, c, d), p).unwrap())
}

/// A lookup server on an ephemeral loopback port, stopped by `stop`.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub stop: CancellationToken,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    pub async fn start(inventory: impl ContainerInventory + 'static, mode: IdentityMode) -> Self {
        let resolver = Arc::new(PortResolver::new(Arc::new(inventory), Span::none()));
        let router = LookupServer::new(resolver, mode, Span::none()).router("/");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let stop = CancellationToken::new();
        let shutdown = stop.clone().cancelled_owned();
        let handle = tokio::spawn(server::serve(listener, router, shutdown));
        Self { addr, stop, handle }
    }

    pub async fn shutdown(self) {
        self.stop.cancel();
        self.handle.await.unwrap().unwrap();
    }
}
