use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dockport_common::container::ContainerRecord;

use super::{ContainerInventory, InventoryError};

/// Fixed set of containers held in memory. Listing order is insertion order.
#[derive(Debug, Default)]
pub struct StaticInventory {
    containers: Vec<(String, ContainerRecord)>,
    inspect_error: Option<InventoryError>,
    list_error: Option<InventoryError>,
    list_calls: AtomicUsize,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, id: impl Into<String>, record: ContainerRecord) -> Self {
        self.containers.push((id.into(), record));
        self
    }

    /// Every `inspect` call fails with `err`.
    pub fn with_inspect_error(mut self, err: InventoryError) -> Self {
        self.inspect_error = Some(err);
        self
    }

    /// Every `list_and_inspect_all` call fails with `err`.
    pub fn with_list_error(mut self, err: InventoryError) -> Self {
        self.list_error = Some(err);
        self
    }

    /// How many times the full listing was requested.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ContainerInventory for StaticInventory {
    async fn inspect(&self, id: &str) -> Result<ContainerRecord, InventoryError> {
        if let Some(err) = &self.inspect_error {
            return Err(err.clone());
        }
        self.containers
            .iter()
            .find(|(container_id, _)| container_id == id)
            .map(|(_, record)| record.clone())
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))
    }

    async fn list_and_inspect_all(&self) -> Result<Vec<ContainerRecord>, InventoryError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = &self.list_error {
            return Err(err.clone());
        }
        Ok(self.containers.iter().map(|(_, record)| record.clone()).collect())
    }
}
