//! # Dockport Core
//!
//! Resolves which host port a container's logical port is published on, and
//! keeps a process informed about a service's registry entry.
//!
//! * **[`inventory`]**: the container engine port and its adapters.
//! * **[`resolver`]**: maps an identity and a port query to a [`Resolution`].
//! * **[`server`]** / **[`client`]**: the HTTP lookup protocol, both ends.
//! * **[`registry`]**: reading and watching the local service registry.
//!
//! [`Resolution`]: dockport_common::container::Resolution

pub mod client;
pub mod inventory;
pub mod protocol;
pub mod registry;
pub mod resolver;
pub mod server;
