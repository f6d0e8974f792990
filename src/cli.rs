use crate::config::{CONFIGURATION_HELP, Config};
use crate::docker_client::DockerClient;
use crate::error::Result;
use crate::manifest_assembler::ManifestAssembler;
use crate::output::{self, DEFAULT_COMPOSE_FILE};
use crate::query::RuntimeQuery;
use crate::reporter::{Reporter, TracingReporter};
use clap::Parser;
use std::ffi::OsString;
use std::path::Path;
use tracing::{info, warn};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "compose-export",
    about = "Export the containers, networks and volumes of a Docker engine as a compose file",
    after_help = CONFIGURATION_HELP
)]
pub struct CLI {
    #[arg(
        short,
        long,
        default_value = DEFAULT_COMPOSE_FILE,
        help = "File name for docker-compose. An empty value only prints to stdout"
    )]
    pub file: String,
    #[arg(short, long, help = "Path to the Docker daemon socket")]
    pub socket_path: Option<String>,
    #[arg(
        short = 'e',
        long = "env-file",
        default_value = ".env",
        help = "Path to .env file"
    )]
    pub env_file: String,
    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase verbosity (-v, -vv, etc.)")]
    pub verbose: u8,
}

/// Rewrites the single-dash `-file` spelling (and `-file=<name>`) to
/// `--file` so clap does not read it as `-f ile`.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(|arg| {
            let arg = arg.into();
            let rewritten = match arg.to_str() {
                Some("-file") => Some(OsString::from("--file")),
                Some(value) if value.starts_with("-file=") => {
                    Some(OsString::from(format!("-{}", value)))
                }
                _ => None,
            };
            rewritten.unwrap_or(arg)
        })
        .collect()
}

/// Runs one export. Only client construction errors are returned; everything
/// else is reported and the export carries on.
pub async fn export(cli: &CLI) -> Result<()> {
    let config = Config::from_env_and_cli(cli);
    info!("Using Docker host {}", config.docker_host);

    let client = DockerClient::from_host(&config.docker_host)?;
    let reporter = TracingReporter;
    export_with(&client, &reporter, &config).await;
    Ok(())
}

pub async fn export_with<Q, R>(client: &Q, reporter: &R, config: &Config)
where
    Q: RuntimeQuery,
    R: Reporter,
{
    let manifest = ManifestAssembler::new(client, reporter).assemble().await;

    let document = match output::render_manifest(&manifest) {
        Ok(document) => document,
        Err(e) => {
            reporter.report("render manifest", &e);
            return;
        }
    };

    let target = if config.compose_file.is_empty() {
        None
    } else {
        if config.compose_file != DEFAULT_COMPOSE_FILE {
            warn!(
                "Writing to {} ({} is ignored)",
                DEFAULT_COMPOSE_FILE, config.compose_file
            );
        }
        Some(Path::new(DEFAULT_COMPOSE_FILE))
    };

    let mut stdout = std::io::stdout().lock();
    output::write_outputs(&document, target, &mut stdout, reporter);
}
