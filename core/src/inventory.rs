//! The container inventory as seen by the resolver.
//!
//! The inventory is an external collaborator: the resolver only ever reads a
//! snapshot of container records from it and never caches what it reads.
//! Both operations may be slow and are awaited once per resolution.

use async_trait::async_trait;
use dockport_common::container::ContainerRecord;
pub use dockport_common::error::InventoryError;

mod docker;
mod memory;

pub use docker::DockerInventory;
pub use memory::StaticInventory;

#[async_trait]
pub trait ContainerInventory: Send + Sync {
    /// Inspects one container by its backend identifier.
    ///
    /// Returns [`InventoryError::NotFound`] when the identifier is unknown.
    async fn inspect(&self, id: &str) -> Result<ContainerRecord, InventoryError>;

    /// Lists running containers and inspects each of them, in backend order.
    async fn list_and_inspect_all(&self) -> Result<Vec<ContainerRecord>, InventoryError>;
}
