mod commands;
mod signals;
mod terminal;

use commands::{CommandLine, Commands, info, lookup, serve, watch};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging();

    match commands.command {
        Commands::Serve(args) => {
            print::header("starting lookup server");
            serve::serve(args).await
        }
        Commands::Lookup(args) => lookup::lookup(args).await,
        Commands::Watch(args) => {
            print::header("watching service");
            watch::watch(args).await
        }
        Commands::Info { interface } => {
            print::header("about this host");
            info::info(&interface)
        }
    }
}
