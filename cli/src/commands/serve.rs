use std::sync::Arc;

use anyhow::Context;
use dockport_common::config::{IdentityMode, WatchConfig};
use dockport_core::inventory::DockerInventory;
use dockport_core::registry::ServiceWatcher;
use dockport_core::resolver::PortResolver;
use dockport_core::server::{self, LookupServer};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn};

use crate::commands::ServeArgs;
use crate::signals;
use crate::terminal::print::{self, GLOBAL_KEY_WIDTH};

pub async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.server_config();
    config.validate().context("invalid server configuration")?;

    let inventory = DockerInventory::connect(&config.docker_url)
        .with_context(|| format!("cannot reach container engine at {}", config.docker_url))?;
    let resolver = Arc::new(PortResolver::new(Arc::new(inventory), info_span!("resolver")));
    let router = LookupServer::new(resolver, config.mode, info_span!("lookup")).router(&config.lookup_path);

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("cannot listen on {}", config.listen))?;

    GLOBAL_KEY_WIDTH.set(9);
    print::aligned_line("Listen", config.listen.to_string());
    print::aligned_line("Engine", config.docker_url.as_str());
    print::aligned_line("Identity", match config.mode {
        IdentityMode::Remote => "request body",
        IdentityMode::SourceIp => "source address",
    });

    let stop = CancellationToken::new();
    let watcher = match args.watch_config() {
        Some(watch) => Some(log_registry_changes(watch, stop.clone())?),
        None => None,
    };

    let shutdown = {
        let stop = stop.clone();
        async move {
            tokio::select! {
                _ = signals::shutdown_signal() => stop.cancel(),
                _ = stop.cancelled() => {}
            }
        }
    };

    info!(listen = %config.listen, mode = ?config.mode, "ready");
    let served = server::serve(listener, router, shutdown).await;
    stop.cancel();
    if let Some(handle) = watcher {
        handle.await.context("registry watcher task failed")?;
    }
    served.context("lookup server failed")?;

    print::end_of_program();
    Ok(())
}

/// Logs every read of `config.service`'s registry entry until `stop` fires.
fn log_registry_changes(config: WatchConfig, stop: CancellationToken) -> anyhow::Result<JoinHandle<()>> {
    let service = config.service.clone();
    let log_entry = move |address: Option<&str>| match address {
        Some(address) => info!(service = %service, address, "registry entry current"),
        None => warn!(service = %service, "registry entry unavailable"),
    };
    let watcher = ServiceWatcher::new(config, log_entry, stop, info_span!("watch"))
        .context("cannot watch the service registry")?;
    Ok(watcher.spawn())
}
