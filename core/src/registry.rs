//! Local service registry: reading entries and watching them change.

use std::io;
use std::path::{Path, PathBuf};

use dockport_common::error::ValidationError;
use dockport_common::registry::{self as entry, RegistryEntry};
use thiserror::Error;

mod watcher;

pub use watcher::{Hook, ServiceWatcher, WatchError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("discovery file not present for {service} in {}", dir.display())]
    Missing { service: String, dir: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Reads and validates `<registry_path>/<service>`.
pub async fn read_entry(service: &str, registry_path: &Path) -> Result<RegistryEntry, RegistryError> {
    entry::validate_service_name(service)?;
    let path = registry_path.join(service);
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(RegistryError::Missing {
                service: service.to_string(),
                dir: registry_path.to_path_buf(),
            });
        }
        Err(source) => return Err(RegistryError::Io { path, source }),
    };
    Ok(RegistryEntry::parse(service, &raw)?)
}
