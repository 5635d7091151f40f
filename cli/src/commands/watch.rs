use anyhow::Context;
use dockport_core::registry::ServiceWatcher;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn};

use crate::commands::WatchArgs;
use crate::signals;
use crate::terminal::print::{self, GLOBAL_KEY_WIDTH};

/// Environment variable carrying the current address to `--exec` commands.
pub const ADDRESS_ENV: &str = "DOCKPORT_ADDRESS";

pub async fn watch(args: WatchArgs) -> anyhow::Result<()> {
    let config = args.watch_config();

    GLOBAL_KEY_WIDTH.set(8);
    print::aligned_line("Service", config.service.as_str());
    print::aligned_line("Registry", config.registry_path.display().to_string());
    print::aligned_line("Interval", format!("{}s", config.interval.as_secs()));

    let service = config.service.clone();
    let exec = args.exec.clone();
    let pre_hook = move |address: Option<&str>| {
        match address {
            Some(address) => info!(service = %service, address, "registry entry current"),
            None => warn!(service = %service, "registry entry unavailable"),
        }
        if let Some(command) = exec.as_deref() {
            run_command(command, address);
        }
    };
    let post_hook = |address: Option<&str>| debug!(address, "registry entry re-read");

    let stop = CancellationToken::new();
    let handle = ServiceWatcher::new(config, pre_hook, stop.clone(), info_span!("watch"))
        .context("cannot watch the service registry")?
        .with_post_hook(post_hook)
        .spawn();

    signals::shutdown_signal().await;
    stop.cancel();
    handle.await.context("registry watcher task failed")?;

    print::end_of_program();
    Ok(())
}

/// Starts `command` through the shell. The watcher does not wait for it to
/// finish.
fn run_command(command: &str, address: Option<&str>) {
    let mut child = Command::new("sh");
    child.arg("-c").arg(command);
    match address {
        Some(address) => child.env(ADDRESS_ENV, address),
        None => child.env_remove(ADDRESS_ENV),
    };

    match child.spawn() {
        Ok(mut child) => {
            let command = command.to_string();
            tokio::spawn(async move {
                match child.wait().await {
                    Ok(status) if status.success() => debug!(command = %command, "hook command finished"),
                    Ok(status) => warn!(command = %command, %status, "hook command failed"),
                    Err(err) => warn!(command = %command, error = %err, "hook command lost"),
                }
            });
        }
        Err(err) => warn!(command = %command, error = %err, "cannot start hook command"),
    }
}
