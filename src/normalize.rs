//! Field derivation rules from inspected engine state to compose fields.
//!
//! Every function here is pure; failures are surfaced as values and left to
//! the caller to report.

use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;

use crate::compose::{LogConfig, NetworkAttachment, NetworkSpec, ServiceSpec, VolumeSpec};
use crate::types::{
    ContainerInspect, EndpointSettings, LogDriverConfig, NetworkInspect, PortBinding,
    RestartPolicy, Volume,
};

/// Engine log driver that compose applies when `logging.type` is absent.
pub const DEFAULT_LOG_DRIVER: &str = "json-file";

/// Compose schema emitted for engines newer than [`SCHEMA_THRESHOLD`].
pub const MODERN_SCHEMA: &str = "3.7";

/// Engine version with its dots removed ("18.06.0" -> 18060).
pub const SCHEMA_THRESHOLD: i64 = 18060;

const DEFAULT_PROTOCOL: &str = "tcp";

/// Strips every `/` from an engine container name (`/web` -> `web`).
pub fn container_name(raw: &str) -> String {
    raw.replace('/', "")
}

pub fn restart_policy(policy: &RestartPolicy) -> String {
    if policy.is_none() {
        return String::new();
    }
    policy.name.clone()
}

/// Joins arguments with single spaces. Arguments containing spaces are not
/// quoted, so such commands do not survive a round trip.
pub fn flatten_command(args: &[String]) -> String {
    args.join(" ")
}

/// One `hostIP:hostPort:containerPort/protocol` entry per host binding.
pub fn format_ports(ports: &BTreeMap<String, Option<Vec<PortBinding>>>) -> Vec<String> {
    let mut formatted = Vec::new();
    for (key, bindings) in ports {
        let Some(bindings) = bindings else {
            continue;
        };
        let (container_port, protocol) = key
            .split_once('/')
            .unwrap_or((key.as_str(), DEFAULT_PROTOCOL));
        for binding in bindings {
            formatted.push(format!(
                "{}:{}:{}/{}",
                binding.host_ip, binding.host_port, container_port, protocol
            ));
        }
    }
    formatted
}

/// Removes the container's own hostname from an alias list. The engine
/// re-adds it on every container creation.
pub fn strip_hostname_alias(aliases: &[String], hostname: &str) -> Vec<String> {
    aliases
        .iter()
        .filter(|alias| alias.as_str() != hostname)
        .cloned()
        .collect()
}

pub fn network_attachments(
    endpoints: &BTreeMap<String, EndpointSettings>,
    hostname: &str,
) -> BTreeMap<String, NetworkAttachment> {
    endpoints
        .iter()
        .map(|(network, endpoint)| {
            let aliases = endpoint.aliases.as_deref().unwrap_or_default();
            (
                network.clone(),
                NetworkAttachment {
                    aliases: strip_hostname_alias(aliases, hostname),
                },
            )
        })
        .collect()
}

pub fn log_config(driver: &LogDriverConfig) -> LogConfig {
    let options = driver.config.clone().unwrap_or_default();
    if driver.log_type == DEFAULT_LOG_DRIVER {
        return LogConfig {
            log_type: String::new(),
            options,
        };
    }
    LogConfig {
        log_type: driver.log_type.clone(),
        options,
    }
}

/// Outcome of mapping an engine version onto a compose schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Engine is newer than the threshold.
    Modern,
    /// Engine is at or below the threshold; the raw version is kept.
    Runtime(String),
    /// The version did not parse as a number once its dots were removed.
    /// Renders as the raw string.
    Unknown { raw: String, source: ParseIntError },
}

impl SchemaVersion {
    pub fn as_str(&self) -> &str {
        match self {
            SchemaVersion::Modern => MODERN_SCHEMA,
            SchemaVersion::Runtime(raw) | SchemaVersion::Unknown { raw, .. } => raw,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn select_schema_version(engine_version: &str) -> SchemaVersion {
    match engine_version.replace('.', "").parse::<i64>() {
        Ok(numeric) if numeric > SCHEMA_THRESHOLD => SchemaVersion::Modern,
        Ok(_) => SchemaVersion::Runtime(engine_version.to_string()),
        Err(source) => SchemaVersion::Unknown {
            raw: engine_version.to_string(),
            source,
        },
    }
}

/// Networks the engine reports as internal are marked external. The two
/// flags mean different things; the mapping is kept so existing exports stay
/// stable and is logged by the assembler.
pub fn network_spec(network: &NetworkInspect) -> NetworkSpec {
    NetworkSpec {
        name: network.name.clone(),
        external: network.internal,
    }
}

pub fn volume_spec(volume: &Volume) -> VolumeSpec {
    VolumeSpec {
        driver: volume.driver.clone(),
        driver_opts: volume.options.clone().unwrap_or_default(),
    }
}

pub fn service_spec(container: &ContainerInspect) -> ServiceSpec {
    let config = &container.config;
    let host = &container.host_config;
    let settings = &container.network_settings;

    ServiceSpec {
        container_name: container_name(&container.name),
        image: config.image.clone(),
        restart: restart_policy(&host.restart_policy),
        working_dir: config.working_dir.clone(),
        command: flatten_command(config.cmd.as_deref().unwrap_or_default()),
        volumes: host.binds.clone().unwrap_or_default(),
        ports: settings.ports.as_ref().map(format_ports).unwrap_or_default(),
        environment: config.env.clone().unwrap_or_default(),
        networks: settings
            .networks
            .as_ref()
            .map(|endpoints| network_attachments(endpoints, &config.hostname))
            .unwrap_or_default(),
        logging: log_config(&host.log_config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn binding(ip: &str, port: &str) -> PortBinding {
        PortBinding {
            host_ip: ip.to_string(),
            host_port: port.to_string(),
        }
    }

    #[test]
    fn test_container_name_strips_separator() {
        assert_eq!(container_name("/web"), "web");
        assert_eq!(container_name("web"), "web");
        assert_eq!(container_name("/my_app-1.db"), "my_app-1.db");
    }

    #[test]
    fn test_restart_policy() {
        let none = RestartPolicy {
            name: "no".to_string(),
            maximum_retry_count: 0,
        };
        assert_eq!(restart_policy(&none), "");
        assert_eq!(restart_policy(&RestartPolicy::default()), "");

        for name in ["always", "on-failure", "unless-stopped"] {
            let policy = RestartPolicy {
                name: name.to_string(),
                maximum_retry_count: 3,
            };
            assert_eq!(restart_policy(&policy), name);
        }
    }

    #[test]
    fn test_flatten_command() {
        assert_eq!(
            flatten_command(&strings(&["nginx", "-g", "daemon off;"])),
            "nginx -g daemon off;"
        );
        assert_eq!(flatten_command(&[]), "");
    }

    #[test]
    fn test_format_ports_one_entry_per_binding() {
        let mut ports = BTreeMap::new();
        ports.insert(
            "80/tcp".to_string(),
            Some(vec![binding("0.0.0.0", "8080"), binding("::", "8080")]),
        );
        ports.insert("53/udp".to_string(), Some(vec![binding("127.0.0.1", "5353")]));
        ports.insert("9000/tcp".to_string(), None);
        ports.insert("9001/tcp".to_string(), Some(vec![]));

        let formatted: BTreeSet<String> = format_ports(&ports).into_iter().collect();
        let expected: BTreeSet<String> = strings(&[
            "0.0.0.0:8080:80/tcp",
            ":::8080:80/tcp",
            "127.0.0.1:5353:53/udp",
        ])
        .into_iter()
        .collect();
        assert_eq!(formatted, expected);
    }

    #[test]
    fn test_format_ports_defaults_protocol() {
        let mut ports = BTreeMap::new();
        ports.insert("443".to_string(), Some(vec![binding("", "443")]));
        assert_eq!(format_ports(&ports), strings(&[":443:443/tcp"]));
    }

    #[test]
    fn test_strip_hostname_alias_keeps_order() {
        let aliases = strings(&["db", "abc123", "primary", "abc123"]);
        assert_eq!(
            strip_hostname_alias(&aliases, "abc123"),
            strings(&["db", "primary"])
        );
        assert!(strip_hostname_alias(&[], "abc123").is_empty());
    }

    #[test]
    fn test_network_attachments_handles_missing_aliases() {
        let mut endpoints = BTreeMap::new();
        endpoints.insert(
            "app-net".to_string(),
            EndpointSettings {
                aliases: Some(strings(&["web", "myhost"])),
                ..Default::default()
            },
        );
        endpoints.insert("bridge".to_string(), EndpointSettings::default());

        let attachments = network_attachments(&endpoints, "myhost");
        assert_eq!(attachments["app-net"].aliases, strings(&["web"]));
        assert!(attachments["bridge"].aliases.is_empty());
    }

    #[test]
    fn test_log_config_hides_default_driver() {
        let mut options = BTreeMap::new();
        options.insert("max-size".to_string(), "10m".to_string());

        let default = log_config(&LogDriverConfig {
            log_type: DEFAULT_LOG_DRIVER.to_string(),
            config: Some(options.clone()),
        });
        assert_eq!(default.log_type, "");
        assert_eq!(default.options, options);

        let syslog = log_config(&LogDriverConfig {
            log_type: "syslog".to_string(),
            config: Some(options.clone()),
        });
        assert_eq!(syslog.log_type, "syslog");
        assert_eq!(syslog.options, options);
    }

    #[test]
    fn test_select_schema_version() {
        assert_eq!(
            select_schema_version("18.06.0"),
            SchemaVersion::Runtime("18.06.0".to_string())
        );
        assert_eq!(select_schema_version("20.10.5"), SchemaVersion::Modern);
        assert_eq!(select_schema_version("20.10.5").as_str(), "3.7");
        assert_eq!(select_schema_version("18.06.1").as_str(), "3.7");
    }

    #[test]
    fn test_select_schema_version_unparseable() {
        let version = select_schema_version("20.10.5-ce");
        assert!(matches!(version, SchemaVersion::Unknown { .. }));
        assert_eq!(version.as_str(), "20.10.5-ce");

        let empty = select_schema_version("");
        assert!(matches!(empty, SchemaVersion::Unknown { .. }));
        assert_eq!(empty.to_string(), "");
    }

    #[test]
    fn test_network_spec_marks_internal_as_external() {
        let internal = NetworkInspect {
            name: "backend".to_string(),
            internal: true,
            ..Default::default()
        };
        assert!(network_spec(&internal).external);

        let bridge = NetworkInspect {
            name: "bridge".to_string(),
            ..Default::default()
        };
        assert_eq!(
            network_spec(&bridge),
            NetworkSpec {
                name: "bridge".to_string(),
                external: false
            }
        );
    }

    #[test]
    fn test_service_spec_from_inspect() {
        let body = r#"{
            "Id": "f00",
            "Name": "/web",
            "Config": {
                "Hostname": "myhost",
                "Image": "nginx:latest",
                "WorkingDir": "/usr/share/nginx",
                "Cmd": ["nginx", "-g", "daemon off;"],
                "Env": ["PATH=/usr/bin", "MODE=prod"]
            },
            "HostConfig": {
                "Binds": ["/srv/www:/usr/share/nginx/html:ro"],
                "RestartPolicy": {"Name": "always", "MaximumRetryCount": 0},
                "LogConfig": {"Type": "json-file", "Config": {}}
            },
            "NetworkSettings": {
                "Ports": {"80/tcp": [{"HostIp": "0.0.0.0", "HostPort": "8080"}]},
                "Networks": {"app-net": {"Aliases": ["web", "myhost"]}}
            }
        }"#;
        let inspect: ContainerInspect = serde_json::from_str(body).unwrap();
        let service = service_spec(&inspect);

        assert_eq!(service.container_name, "web");
        assert_eq!(service.image, "nginx:latest");
        assert_eq!(service.restart, "always");
        assert_eq!(service.working_dir, "/usr/share/nginx");
        assert_eq!(service.command, "nginx -g daemon off;");
        assert_eq!(service.volumes, strings(&["/srv/www:/usr/share/nginx/html:ro"]));
        assert_eq!(service.ports, strings(&["0.0.0.0:8080:80/tcp"]));
        assert_eq!(service.environment, strings(&["PATH=/usr/bin", "MODE=prod"]));
        assert_eq!(service.networks["app-net"].aliases, strings(&["web"]));
        assert!(service.logging.is_empty());
    }
}
