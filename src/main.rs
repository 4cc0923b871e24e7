// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, hand over to the UI.
// - Exits with status 1 when the upload did not go through.

use catdisk_cli::{config::Cli, ui::run};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they don't mix with the summary on stdout.
    // `RUST_LOG` wins over the default filter.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if !run(&cli)? {
        std::process::exit(1);
    }
    Ok(())
}
