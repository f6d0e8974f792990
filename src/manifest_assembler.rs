use tracing::{info, warn};

use crate::compose::Manifest;
use crate::error::ExportError;
use crate::normalize::{self, SchemaVersion};
use crate::query::RuntimeQuery;
use crate::reporter::Reporter;

/// Builds a [`Manifest`] from whatever the engine reports. Every failed query
/// is handed to the reporter and the affected resource is left out.
pub struct ManifestAssembler<'a, Q: RuntimeQuery, R: Reporter> {
    query: &'a Q,
    reporter: &'a R,
}

impl<'a, Q: RuntimeQuery, R: Reporter> ManifestAssembler<'a, Q, R> {
    pub fn new(query: &'a Q, reporter: &'a R) -> Self {
        Self { query, reporter }
    }

    pub async fn assemble(&self) -> Manifest {
        let mut manifest = Manifest {
            version: self.schema_version().await.to_string(),
            ..Default::default()
        };

        self.collect_networks(&mut manifest).await;
        self.collect_volumes(&mut manifest).await;
        self.collect_services(&mut manifest).await;

        info!(
            "Assembled manifest with {} services, {} networks and {} volumes",
            manifest.services.len(),
            manifest.networks.len(),
            manifest.volumes.len()
        );
        manifest
    }

    async fn schema_version(&self) -> SchemaVersion {
        let raw = match self.query.engine_version().await {
            Ok(version) => version.version,
            Err(e) => {
                self.reporter.report("engine version", &e);
                String::new()
            }
        };

        let selected = normalize::select_schema_version(&raw);
        if let SchemaVersion::Unknown { raw, source } = &selected {
            self.reporter.report(
                "schema version",
                &ExportError::VersionParse {
                    raw: raw.clone(),
                    source: source.clone(),
                },
            );
        }
        selected
    }

    async fn collect_networks(&self, manifest: &mut Manifest) {
        let networks = match self.query.list_networks().await {
            Ok(networks) => networks,
            Err(e) => {
                self.reporter.report("list networks", &e);
                return;
            }
        };

        for summary in networks {
            let network = match self.query.inspect_network(&summary.id).await {
                Ok(network) => network,
                Err(e) => {
                    self.reporter
                        .report(&format!("inspect network {}", summary.name), &e);
                    continue;
                }
            };

            let spec = normalize::network_spec(&network);
            if spec.external {
                warn!(
                    "Network {} is internal-only and is exported as external",
                    spec.name
                );
            }
            manifest.networks.insert(summary.name, spec);
        }
    }

    async fn collect_volumes(&self, manifest: &mut Manifest) {
        let volumes = match self.query.list_volumes().await {
            Ok(volumes) => volumes,
            Err(e) => {
                self.reporter.report("list volumes", &e);
                return;
            }
        };

        for volume in volumes {
            manifest
                .volumes
                .insert(volume.name.clone(), normalize::volume_spec(&volume));
        }
    }

    async fn collect_services(&self, manifest: &mut Manifest) {
        let containers = match self.query.list_containers(true).await {
            Ok(containers) => containers,
            Err(e) => {
                self.reporter.report("list containers", &e);
                return;
            }
        };

        for summary in containers {
            let container = match self.query.inspect_container(&summary.id).await {
                Ok(container) => container,
                Err(e) => {
                    let label = summary
                        .names
                        .first()
                        .map(|name| normalize::container_name(name))
                        .unwrap_or(summary.id);
                    self.reporter
                        .report(&format!("inspect container {}", label), &e);
                    continue;
                }
            };

            let service = normalize::service_spec(&container);
            manifest
                .services
                .insert(service.container_name.clone(), service);
        }
    }
}
