pub mod cli;
pub mod compose;
pub mod config;
pub mod docker_client;
pub mod error;
pub mod manifest_assembler;
pub mod normalize;
pub mod output;
pub mod query;
pub mod reporter;
pub mod types;

use clap::Parser;
pub use cli::CLI;
pub use error::{ExportError, Result};
use tracing_subscriber::EnvFilter;

pub async fn run() -> Result<()> {
    let cli = CLI::parse_from(cli::normalize_args(std::env::args_os()));
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    cli::export(&cli).await
}
