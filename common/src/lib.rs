//! # Dockport Common
//!
//! Shared vocabulary for the dockport workspace.
//!
//! * **[`container`]**: container records, port queries and resolution outcomes.
//! * **[`registry`]**: the local service registry entry format.
//! * **[`network`]**: identity of the local host (hostname, IPv4, MAC).
//! * **[`config`]**: configuration consumed by the server and the watcher.
//! * **[`error`]**: the error taxonomy shared across crates.

pub mod config;
pub mod container;
pub mod error;
pub mod network;
pub mod registry;
