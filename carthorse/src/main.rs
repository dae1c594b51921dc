mod cli;
mod config;
mod error;
mod export;
mod ingest;

use clap::Parser;
use log::error;

use cli::CliArgs;

fn main() {
    env_logger::init();

    let args = CliArgs::parse();
    if let Err(e) = cli::command_line_runner(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}
