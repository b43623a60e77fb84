mod cli;
mod compress;
mod config;
mod convert;
mod input;
mod logging;
mod output;
mod segment;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Segment(args) => segment::run(args),
        Command::Compress(args) => compress::run(args),
    }
}
