use clap::Parser;
use faultline_cli::cli::Cli;
use std::io;
use tracing::error;

fn main() {
    let cli = Cli::parse();

    // Per-target RUST_LOG directives refine the --log-level default
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(cli.log_level.into()),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = faultline_cli::run(&cli, io::stdout().lock()) {
        error!("{err:#}");
        std::process::exit(1);
    }
}
