//! Stepwise CLI - discover and apply versioned SQL migrations

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{list, migrate, new, status};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match &cli.command {
        cli::Commands::Migrate(args) => migrate::execute(args, &cli.global),
        cli::Commands::Status(args) => status::execute(args, &cli.global),
        cli::Commands::List(args) => list::execute(args, &cli.global),
        cli::Commands::New(args) => new::execute(args, &cli.global),
    }
}

/// `info` by default, `debug` with `--verbose`; `RUST_LOG` wins over both.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_target(false)
        .init();
}
