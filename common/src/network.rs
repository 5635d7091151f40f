//! # Local Host Identity
//!
//! Gathers what a container knows about itself: its hostname and the IPv4 and
//! hardware address of one named interface. That triple is what the lookup
//! server matches against the container inventory.

pub mod host_info;
pub mod interface;
