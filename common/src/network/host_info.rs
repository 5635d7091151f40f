use pnet::datalink::NetworkInterface;
use thiserror::Error;

use super::interface::{self, NetworkInterfaceExtension};

/// Identity of the local host as seen through one network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub hostname: String,
    pub ip: String,
    pub mac: String,
}

#[derive(Debug, Error)]
pub enum HostInfoError {
    #[error("failed to read hostname: {0}")]
    Hostname(String),

    #[error("no network interface named {0:?}")]
    InterfaceNotFound(String),

    #[error("no IPv4 address found for interface {0:?}")]
    NoAddressFound(String),
}

/// Reads the hostname and the first IPv4 and MAC address of `interface_name`.
pub fn lookup_host_info(interface_name: &str) -> Result<HostInfo, HostInfoError> {
    let hostname = sys_info::hostname().map_err(|e| HostInfoError::Hostname(e.to_string()))?;
    let interface = interface::find_by_name(interface_name)
        .ok_or_else(|| HostInfoError::InterfaceNotFound(interface_name.to_string()))?;
    from_interface(hostname, &interface)
}

/// Builds the identity from an already resolved interface.
///
/// Fails with [`HostInfoError::NoAddressFound`] when the interface has no
/// addresses at all, or none of them is IPv4.
pub fn from_interface(
    hostname: String,
    interface: &NetworkInterface,
) -> Result<HostInfo, HostInfoError> {
    let no_address = || HostInfoError::NoAddressFound(interface.name.clone());
    if interface.ips.is_empty() {
        return Err(no_address());
    }
    let ipv4 = interface.first_ipv4().ok_or_else(no_address)?;

    Ok(HostInfo {
        hostname,
        ip: ipv4.ip().to_string(),
        mac: interface.mac_string(),
    })
}
