//! Main entry point for the tftf CLI tool

use colored::Colorize;
use log::LevelFilter;
use tftf::cli::{Args, run_cli};

fn main() {
    let args = Args::parse_ordered();

    let level = if args.quiet {
        LevelFilter::Error
    } else if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    if let Err(e) = run_cli(args) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
