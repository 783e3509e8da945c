// CLI binary entry point for opusmeta

use clap::Parser;
use std::process;

mod cli;

fn main() {
    let config = cli::Config::parse();

    if let Err(e) = cli::run(config) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}
