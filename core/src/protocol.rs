//! Wire format of the lookup endpoint.
//!
//! ```text
//! POST <lookup-path>
//! Content-Type: application/json
//!
//! {"Hostname":"web","IP":"172.17.0.2","Mac":"02:42:ac:11:00:02","Port":"80"}
//! ```
//!
//! `Port` is `<number>` (implicitly tcp) or `<number>/<tcp|udp>`. A source-IP
//! server only reads `Port`. A successful answer is a bare JSON integer, the
//! host port, or `0` when the container does not publish the port. Failures
//! are non-200 statuses with a plain-text diagnostic body.

use dockport_common::network::host_info::HostInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    #[serde(rename = "Hostname", alias = "hostname", default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(rename = "IP", alias = "ip", default, skip_serializing_if = "String::is_empty")]
    pub ip: String,
    #[serde(rename = "Mac", alias = "mac", default, skip_serializing_if = "String::is_empty")]
    pub mac: String,
    #[serde(rename = "Port", alias = "port")]
    pub port: String,
}

impl LookupRequest {
    pub fn from_host_info(info: &HostInfo, port: impl Into<String>) -> Self {
        Self {
            hostname: info.hostname.clone(),
            ip: info.ip.clone(),
            mac: info.mac.clone(),
            port: port.into(),
        }
    }

    /// Request for a source-IP server, which derives identity from the connection.
    pub fn port_only(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }
}
