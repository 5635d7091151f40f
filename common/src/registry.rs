//! # Service Registry Entries
//!
//! A registry is a directory holding one file per service. The file name is the
//! service name and the file contains a single line: an IPv4 address,
//! optionally followed by `:<port>`.

use std::net::Ipv4Addr;

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    service: String,
    address: String,
    ip: Ipv4Addr,
    port: Option<u16>,
}

impl RegistryEntry {
    /// Validates the raw file contents of `service`'s registry file.
    pub fn parse(service: &str, raw: &str) -> Result<Self, ValidationError> {
        validate_service_name(service)?;
        let address = raw.trim();
        let invalid = || ValidationError::InvalidAddress(address.to_string());

        let (host, port) = match address.split_once(':') {
            Some((host, port)) => (host, Some(port.parse::<u16>().map_err(|_| invalid())?)),
            None => (address, None),
        };
        let ip: Ipv4Addr = host.parse().map_err(|_| invalid())?;

        Ok(Self {
            service: service.to_string(),
            address: address.to_string(),
            ip,
            port,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// The address exactly as written, port suffix included.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// A service name doubles as a file name and must stay inside the registry.
pub fn validate_service_name(name: &str) -> Result<(), ValidationError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(ValidationError::InvalidServiceName(name.to_string()));
    }
    Ok(())
}
