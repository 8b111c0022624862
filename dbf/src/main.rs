mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse_from(wild::args_os());

    match cli.command {
        Commands::Info(args) => commands::info(args)?,
        Commands::Fields(args) => commands::fields(args)?,
        Commands::Dump(args) => commands::dump(args)?,
        Commands::Create(args) => commands::create(args)?,
    };

    Ok(())
}
