use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerInspectResponse, NetworkSettings, PortMap};
use bollard::{API_DEFAULT_VERSION, Docker};
use dockport_common::container::{ContainerRecord, PortQuery};
use tracing::{debug, warn};

use super::{ContainerInventory, InventoryError};

const CONNECT_TIMEOUT_SECS: u64 = 120;

/// Inventory backed by the Docker Engine API.
#[derive(Debug, Clone)]
pub struct DockerInventory {
    docker: Docker,
}

impl DockerInventory {
    /// Connects to `unix://<socket>`, `tcp://<host:port>` or `http://<host:port>`.
    ///
    /// The connection itself is lazy; an unreachable engine surfaces as a
    /// transport error on the first request.
    pub fn connect(url: &str) -> Result<Self, InventoryError> {
        let docker = if url.starts_with("unix://") {
            connect_unix(url)?
        } else if url.starts_with("tcp://") || url.starts_with("http://") {
            Docker::connect_with_http(url, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)
                .map_err(|e| InventoryError::Transport(e.to_string()))?
        } else {
            return Err(InventoryError::Transport(format!(
                "unsupported container engine address {url:?}"
            )));
        };
        Ok(Self { docker })
    }
}

#[cfg(unix)]
fn connect_unix(url: &str) -> Result<Docker, InventoryError> {
    Docker::connect_with_unix(url, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)
        .map_err(|e| InventoryError::Transport(e.to_string()))
}

#[cfg(not(unix))]
fn connect_unix(url: &str) -> Result<Docker, InventoryError> {
    Err(InventoryError::Transport(format!(
        "unix sockets are not supported on this platform: {url:?}"
    )))
}

#[async_trait]
impl ContainerInventory for DockerInventory {
    async fn inspect(&self, id: &str) -> Result<ContainerRecord, InventoryError> {
        let response = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| classify(id, e))?;
        Ok(record_from_inspect(response))
    }

    async fn list_and_inspect_all(&self) -> Result<Vec<ContainerRecord>, InventoryError> {
        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };
        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| InventoryError::Transport(e.to_string()))?;

        let mut records = Vec::with_capacity(summaries.len());
        for id in summaries.into_iter().filter_map(|summary| summary.id) {
            // A container may exit between listing and inspection.
            match self.inspect(&id).await {
                Ok(record) => records.push(record),
                Err(err) => warn!(container = %id, error = %err, "error inspecting container, skipping"),
            }
        }
        Ok(records)
    }
}

fn classify(id: &str, err: BollardError) -> InventoryError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } => InventoryError::NotFound(id.to_string()),
        other => InventoryError::Transport(other.to_string()),
    }
}

fn record_from_inspect(response: ContainerInspectResponse) -> ContainerRecord {
    let hostname = response
        .config
        .and_then(|config| config.hostname)
        .unwrap_or_default();
    let settings = response.network_settings.unwrap_or_default();
    let (ip, mac) = primary_address(&settings);
    let ports = settings.ports.map(normalize_ports).unwrap_or_default();

    ContainerRecord {
        hostname,
        ip,
        mac,
        ports,
    }
}

/// Top-level address of the default bridge, or the first attached network by
/// name when the container only lives on user-defined networks.
fn primary_address(settings: &NetworkSettings) -> (String, String) {
    let top_level_ip = settings.ip_address.clone().unwrap_or_default();
    if !top_level_ip.is_empty() {
        return (top_level_ip, settings.mac_address.clone().unwrap_or_default());
    }

    let networks: BTreeMap<_, _> = settings.networks.iter().flatten().collect();
    networks
        .into_values()
        .find_map(|endpoint| {
            let ip = endpoint.ip_address.clone().filter(|ip| !ip.is_empty())?;
            Some((ip, endpoint.mac_address.clone().unwrap_or_default()))
        })
        .unwrap_or_default()
}

/// Keys the engine reports as `"80/tcp"`; the first binding wins.
fn normalize_ports(ports: PortMap) -> HashMap<PortQuery, u16> {
    ports
        .into_iter()
        .filter_map(|(key, bindings)| {
            let port: PortQuery = match key.parse() {
                Ok(port) => port,
                Err(err) => {
                    debug!(key = %key, error = %err, "ignoring port key");
                    return None;
                }
            };
            let host_port = bindings?.into_iter().next()?.host_port?;
            let host_port: u16 = host_port.split('/').next()?.parse().ok()?;
            (host_port != 0).then_some((port, host_port))
        })
        .collect()
}
