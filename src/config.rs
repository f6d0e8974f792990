use crate::cli::CLI;
use crate::docker_client::DEFAULT_SOCKET_PATH;
use crate::output::DEFAULT_COMPOSE_FILE;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

pub const CONFIGURATION_HELP: &str = "\
Configuration options:
  1. Command line flags:
     compose-export -file docker-compose.yml --socket-path /var/run/docker.sock --env-file .env -v

  2. Create a .env file (or use --env-file to specify a different file):
     COMPOSE_FILE=docker-compose.yml
     SOCKET_PATH=/var/run/docker.sock
     DOCKER_HOST=unix:///var/run/docker.sock

  3. DOCKER_HOST in the process environment.

Command line flags take precedence over the .env file, which takes precedence over the environment.
Empty values are ignored.

The document is always written to docker-compose.yml and echoed to stdout. Setting
--file / COMPOSE_FILE to an empty value skips the file and only prints to stdout;
any other value is ignored.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Value of `--file`. An empty value disables writing the file.
    pub compose_file: String,
    /// Engine endpoint in `unix:///path` form.
    pub docker_host: String,
}

impl Config {
    pub fn from_env_and_cli(cli: &CLI) -> Self {
        Self::from_sources(cli, std::env::var("DOCKER_HOST").ok())
    }

    /// Priority: CLI args > env file > process environment > defaults.
    pub fn from_sources(cli: &CLI, process_docker_host: Option<String>) -> Self {
        let env_vars = read_env_file(Path::new(&cli.env_file));

        let compose_file = if cli.file != DEFAULT_COMPOSE_FILE {
            cli.file.clone()
        } else {
            env_vars
                .get("COMPOSE_FILE")
                .cloned()
                .unwrap_or_else(|| cli.file.clone())
        };

        let docker_host = non_empty(cli.socket_path.as_ref())
            .map(|path| format!("unix://{}", path))
            .or_else(|| {
                non_empty(env_vars.get("SOCKET_PATH")).map(|path| format!("unix://{}", path))
            })
            .or_else(|| non_empty(env_vars.get("DOCKER_HOST")).cloned())
            .or_else(|| non_empty(process_docker_host.as_ref()).cloned())
            .unwrap_or_else(|| format!("unix://{}", DEFAULT_SOCKET_PATH));

        Config {
            compose_file,
            docker_host,
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<&String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses `KEY=VALUE` lines. A missing or unreadable file yields no variables.
fn read_env_file(path: &Path) -> HashMap<String, String> {
    let mut env_vars = HashMap::new();
    if !path.exists() {
        return env_vars;
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Ignoring env file {}: {}", path.display(), e);
            return env_vars;
        }
    };
    for line in content.lines() {
        let line = line.trim();
        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            env_vars.insert(key.trim().to_string(), value.to_string());
        }
    }
    env_vars
}
