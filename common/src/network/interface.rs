use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network};

pub trait NetworkInterfaceExtension {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network>;
    fn first_ipv4(&self) -> Option<Ipv4Network>;
    fn mac_string(&self) -> String;
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network> {
        self.ips
            .iter()
            .filter_map(|ip| {
                if let IpNetwork::V4(ipv4) = ip {
                    Some(*ipv4)
                } else {
                    None
                }
            })
            .collect()
    }

    /// First IPv4 network in the order the OS reports them.
    fn first_ipv4(&self) -> Option<Ipv4Network> {
        self.get_ipv4_nets().into_iter().next()
    }

    /// Lower-case, colon separated. Empty when the interface has no hardware address.
    fn mac_string(&self) -> String {
        self.mac.map(|mac| mac.to_string()).unwrap_or_default()
    }
}

/// Looks up an interface of this host by its exact name.
pub fn find_by_name(name: &str) -> Option<NetworkInterface> {
    datalink::interfaces()
        .into_iter()
        .find(|interface| interface.name == name)
}

/// Every interface that is up, loopback excluded, in OS order.
pub fn active_interfaces() -> Vec<NetworkInterface> {
    datalink::interfaces()
        .into_iter()
        .filter(|i| i.is_up() && !i.is_loopback())
        .collect()
}
