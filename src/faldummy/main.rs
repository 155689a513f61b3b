use clap::Parser;
use colored::Colorize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod args;
mod cli;

use args::Cli;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = cli::run(cli) {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so `cat` output stays clean. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "faldummy=debug,fal_dummy=debug"
    } else {
        "faldummy=warn,fal_dummy=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
