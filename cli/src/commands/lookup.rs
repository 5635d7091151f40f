use anyhow::{Context, bail};
use dockport_common::container::{NOT_EXPOSED, Resolution};
use dockport_core::client::RemoteLookupClient;
use tracing::{info_span, warn};

use crate::commands::LookupArgs;

/// Prints the resolved host port on stdout, or the not-exposed sentinel.
pub async fn lookup(args: LookupArgs) -> anyhow::Result<()> {
    let client = RemoteLookupClient::new(args.server.as_str(), info_span!("client"));

    let outcome = if args.port_only {
        client.lookup_port_only(&args.port).await
    } else {
        client.lookup_self(&args.interface, &args.port).await
    };
    let resolution = outcome.with_context(|| format!("lookup of port {} against {} failed", args.port, args.server))?;

    match resolution {
        Resolution::Resolved(port) => println!("{port}"),
        Resolution::NotExposed => {
            warn!(port = %args.port, "port is not published on the host");
            println!("{NOT_EXPOSED}");
        }
        other => bail!("unexpected lookup outcome: {other}"),
    }
    Ok(())
}
