pub mod info;
pub mod lookup;
pub mod serve;
pub mod watch;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use dockport_common::config::{
    DEFAULT_DOCKER_URL, DEFAULT_LISTEN_PORT, DEFAULT_LOOKUP_PATH, IdentityMode, ServerConfig, WatchConfig,
};

const DEFAULT_INTERFACE: &str = "eth0";

#[derive(Parser)]
#[command(name = "dockport")]
#[command(version, about = "Find the host port a container port is published on.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer port lookups from containers
    #[command(alias = "s")]
    Serve(ServeArgs),
    /// Ask a lookup server which host port one of our ports is published on
    #[command(alias = "l")]
    Lookup(LookupArgs),
    /// Follow a service's entry in the local registry
    #[command(alias = "w")]
    Watch(WatchArgs),
    /// Show the identity this host presents to a lookup server
    #[command(alias = "i")]
    Info {
        #[arg(short, long, default_value = DEFAULT_INTERFACE)]
        interface: String,
    },
}

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_LISTEN_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Container engine API endpoint
    #[arg(long, env = "DOCKER_URL", default_value = DEFAULT_DOCKER_URL)]
    pub docker_url: String,

    /// Identify callers by their source address instead of the request body
    #[arg(long)]
    pub source_ip: bool,

    /// Path the lookup endpoint is mounted on
    #[arg(long, default_value = DEFAULT_LOOKUP_PATH)]
    pub lookup_path: String,

    /// Log changes to this service's registry entry while serving
    #[arg(long, value_name = "SERVICE", requires = "discovery_path")]
    pub watch: Option<String>,

    /// Local service registry directory
    #[arg(long, env = "DISCOVERY_PATH")]
    pub discovery_path: Option<PathBuf>,
}

impl ServeArgs {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            listen: SocketAddr::new(self.bind, self.port),
            docker_url: self.docker_url.clone(),
            mode: if self.source_ip {
                IdentityMode::SourceIp
            } else {
                IdentityMode::Remote
            },
            lookup_path: self.lookup_path.clone(),
        }
    }

    pub fn watch_config(&self) -> Option<WatchConfig> {
        match (&self.watch, &self.discovery_path) {
            (Some(service), Some(path)) => Some(WatchConfig::new(service.as_str(), path.as_path())),
            _ => None,
        }
    }
}

#[derive(Args)]
pub struct LookupArgs {
    /// Port to resolve, e.g. `80`, `80/tcp` or `53/udp`
    pub port: String,

    /// URL of the lookup server
    #[arg(short, long, env = "DOCKPORT_SERVER")]
    pub server: String,

    /// Interface whose address and MAC identify this host
    #[arg(short, long, default_value = DEFAULT_INTERFACE)]
    pub interface: String,

    /// Send only the port, for servers running with --source-ip
    #[arg(long)]
    pub port_only: bool,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Service name, which is also the registry file name
    pub service: String,

    /// Local service registry directory
    #[arg(long, env = "DISCOVERY_PATH")]
    pub discovery_path: PathBuf,

    /// Seconds between unconditional re-checks
    #[arg(long, default_value_t = 60)]
    pub interval: u64,

    /// Command to run with DOCKPORT_ADDRESS set whenever the entry is re-read
    #[arg(long)]
    pub exec: Option<String>,
}

impl WatchArgs {
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig::new(self.service.as_str(), self.discovery_path.as_path())
            .with_interval(Duration::from_secs(self.interval))
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
