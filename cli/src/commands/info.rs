use colored::*;
use dockport_common::network::host_info;
use dockport_common::network::interface;

use crate::terminal::print::{self, GLOBAL_KEY_WIDTH};
use crate::terminal::{colors, network_fmt};

pub fn info(interface_name: &str) -> anyhow::Result<()> {
    GLOBAL_KEY_WIDTH.set(10);

    print_about_the_tool();
    print_identity(interface_name);
    print_network_interfaces();

    print::end_of_program();
    Ok(())
}

fn print_about_the_tool() {
    print::aligned_line("Version", env!("CARGO_PKG_VERSION"));
}

/// What `lookup` sends for this interface, or why it cannot.
fn print_identity(interface_name: &str) {
    print::header("lookup identity");
    match host_info::lookup_host_info(interface_name) {
        Ok(info) => {
            print::aligned_line("Interface", interface_name);
            print::aligned_line("Hostname", info.hostname);
            print::aligned_line("IP", info.ip.color(colors::IPV4_ADDR));
            let mac = if info.mac.is_empty() {
                "none".color(colors::MISSING)
            } else {
                info.mac.color(colors::MAC_ADDR)
            };
            print::aligned_line("MAC", mac);
        }
        Err(err) => print::aligned_line("Identity", err.to_string().color(colors::MISSING)),
    }
}

fn print_network_interfaces() {
    print::header("network interfaces");
    for (idx, iface) in interface::active_interfaces().iter().enumerate() {
        network_fmt::print_interface(iface, idx);
    }
}
