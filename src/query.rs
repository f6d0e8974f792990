use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ContainerInspect, ContainerSummary, EngineVersion, NetworkInspect, NetworkSummary, Volume,
};

/// Read-only view of a container engine.
#[async_trait]
pub trait RuntimeQuery: Send + Sync {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>>;

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspect>;

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>>;

    async fn inspect_network(&self, id: &str) -> Result<NetworkInspect>;

    async fn list_volumes(&self) -> Result<Vec<Volume>>;

    async fn engine_version(&self) -> Result<EngineVersion>;
}
