use colored::*;
use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::IpNetwork;

use crate::terminal::{colors, print};

pub fn to_key_value_pair_net(ip_net: &[IpNetwork]) -> Vec<(String, ColoredString)> {
    ip_net
        .iter()
        .map(|ip_network| match ip_network {
            IpNetwork::V4(net) => {
                let address = net.ip().to_string().color(colors::IPV4_ADDR);
                let prefix = net.prefix().to_string().color(colors::IPV4_PREFIX);
                ("IPv4".to_string(), format!("{address}/{prefix}").color(colors::SEPARATOR))
            }
            IpNetwork::V6(net) => {
                let address = net.ip().to_string().color(colors::IPV6_ADDR);
                let prefix = net.prefix().to_string().color(colors::IPV6_PREFIX);
                ("IPv6".to_string(), format!("{address}/{prefix}").color(colors::SEPARATOR))
            }
        })
        .collect()
}

pub fn print_interface(interface: &NetworkInterface, idx: usize) {
    print::tree_head(idx, &interface.name);
    let mut key_value_pair = to_key_value_pair_net(&interface.ips);
    if let Some(mac_addr) = interface.mac {
        key_value_pair.push(("MAC".to_string(), mac_addr.to_string().color(colors::MAC_ADDR)));
    }
    print::as_tree_one_level(key_value_pair);
}
