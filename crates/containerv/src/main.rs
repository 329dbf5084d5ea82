//! Entry point for the `containerv` smoke-test harness CLI (§6 "Container
//! API"). Parses arguments, initializes logging from [`Config::log_level`],
//! and dispatches to the [`containerv::commands`] implementation of
//! whichever subcommand was requested.

use anyhow::Result;
use clap::Parser;
use containerv::cli::{Cli, Command};
use containerv::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();
    common::logging::init("containerv", cli.config.log_level());

    match cli.command {
        Command::Create(args) => commands::create(&cli.config, args),
        Command::Spawn(args) => commands::spawn(&cli.config, args),
        Command::Destroy(args) => commands::destroy(&cli.config, args),
        Command::Join(args) => commands::join(&cli.config, args),
    }
}
