//! platshim CLI: the `platshim` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "PLATSHIM_LOG";

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path, json } => commands::init::run(path, json),

        Commands::Resolve {
            module,
            platform,
            config,
            origin,
            json,
        } => commands::resolve::run(module, platform, config, origin, json),

        Commands::AliasTable {
            platform,
            config,
            out,
        } => commands::alias_table::run(platform, config, out),

        Commands::Stub {
            module,
            format,
            exports,
            out,
        } => commands::stub::run(module, format.into(), exports, out),

        Commands::Check {
            config,
            alias_table,
            platform,
            json,
        } => commands::check::run(config, alias_table, platform, json),
    }
}
