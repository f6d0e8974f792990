use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::compose::Manifest;
use crate::error::{ExportError, Result};
use crate::reporter::Reporter;

/// Name the document is always written under, whatever `--file` says.
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

pub fn render_manifest(manifest: &Manifest) -> Result<String> {
    Ok(serde_yaml::to_string(manifest)?)
}

/// Writes `document` to `target` (when set) and echoes it to `stdout`.
/// The two outputs are independent: a failure on one is reported and the
/// other still happens. Returns whether both succeeded.
pub fn write_outputs<R: Reporter, W: Write>(
    document: &str,
    target: Option<&Path>,
    stdout: &mut W,
    reporter: &R,
) -> bool {
    let mut ok = true;

    if let Some(path) = target {
        match std::fs::write(path, document) {
            Ok(()) => info!("Wrote {}", path.display()),
            Err(e) => {
                reporter.report(
                    &format!("write {}", path.display()),
                    &ExportError::Io(e),
                );
                ok = false;
            }
        }
    }

    if let Err(e) = writeln!(stdout, "{}", document) {
        reporter.report("write stdout", &ExportError::Io(e));
        ok = false;
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{LogConfig, NetworkAttachment, NetworkSpec, ServiceSpec};
    use crate::reporter::RecordingReporter;
    use std::collections::BTreeMap;

    fn web_manifest() -> Manifest {
        let mut networks = BTreeMap::new();
        networks.insert(
            "app-net".to_string(),
            NetworkAttachment {
                aliases: vec!["web".to_string()],
            },
        );
        let service = ServiceSpec {
            container_name: "web".to_string(),
            image: "nginx:latest".to_string(),
            restart: "always".to_string(),
            ports: vec!["0.0.0.0:8080:80/tcp".to_string()],
            networks,
            ..Default::default()
        };

        let mut manifest = Manifest {
            version: "3.7".to_string(),
            ..Default::default()
        };
        manifest.networks.insert(
            "app-net".to_string(),
            NetworkSpec {
                name: "app-net".to_string(),
                external: false,
            },
        );
        manifest.services.insert("web".to_string(), service);
        manifest
    }

    #[test]
    fn test_render_omits_empty_fields() {
        let document = render_manifest(&web_manifest()).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&document).unwrap();

        assert_eq!(value["version"].as_str(), Some("3.7"));
        let web = &value["services"]["web"];
        assert_eq!(web["container_name"].as_str(), Some("web"));
        assert_eq!(web["restart"].as_str(), Some("always"));
        assert_eq!(web["ports"][0].as_str(), Some("0.0.0.0:8080:80/tcp"));
        assert_eq!(web["networks"]["app-net"]["aliases"][0].as_str(), Some("web"));
        for omitted in ["working_dir", "command", "environment", "logging", "external", "driver"] {
            assert!(!document.contains(omitted), "{} should be omitted", omitted);
        }
    }

    #[test]
    fn test_render_logging_block() {
        let mut manifest = web_manifest();
        let mut options = BTreeMap::new();
        options.insert("syslog-address".to_string(), "udp://1.2.3.4:514".to_string());
        if let Some(service) = manifest.services.get_mut("web") {
            service.logging = LogConfig {
                log_type: "syslog".to_string(),
                options,
            };
        }

        let document = render_manifest(&manifest).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&document).unwrap();
        let logging = &value["services"]["web"]["logging"];
        assert_eq!(logging["type"].as_str(), Some("syslog"));
        assert_eq!(
            logging["options"]["syslog-address"].as_str(),
            Some("udp://1.2.3.4:514")
        );
    }

    #[test]
    fn test_write_outputs_file_and_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_COMPOSE_FILE);
        let reporter = RecordingReporter::new();
        let mut stdout = Vec::new();

        assert!(write_outputs("version: '3.7'\n", Some(path.as_path()), &mut stdout, &reporter));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "version: '3.7'\n");
        assert_eq!(String::from_utf8(stdout).unwrap(), "version: '3.7'\n\n");
        assert!(reporter.entries().is_empty());
    }

    #[test]
    fn test_write_failure_still_echoes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join(DEFAULT_COMPOSE_FILE);
        let reporter = RecordingReporter::new();
        let mut stdout = Vec::new();

        assert!(!write_outputs("version: ''\n", Some(path.as_path()), &mut stdout, &reporter));
        assert!(!stdout.is_empty());
        assert_eq!(reporter.entries().len(), 1);
    }
}
