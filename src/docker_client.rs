use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, trace};

use crate::error::{ExportError, Result};
use crate::query::RuntimeQuery;
use crate::types::{
    ContainerInspect, ContainerSummary, EngineVersion, NetworkInspect, NetworkSummary, Volume,
    VolumeList,
};

pub const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";

/// Docker Engine API client over the daemon's Unix socket. Each request
/// opens a fresh connection and reads until the daemon closes it.
#[derive(Debug, Clone)]
pub struct DockerClient {
    socket_path: PathBuf,
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

impl DockerClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Result<Self> {
        let socket_path = socket_path.into();
        if !socket_path.exists() {
            return Err(ExportError::Connect {
                host: socket_path.display().to_string(),
                reason: "socket does not exist".to_string(),
            });
        }
        Ok(Self { socket_path })
    }

    /// Accepts a `DOCKER_HOST` style value. Only `unix://` hosts are supported.
    pub fn from_host(host: &str) -> Result<Self> {
        match host.strip_prefix("unix://") {
            Some(path) => Self::new(path),
            None => Err(ExportError::Connect {
                host: host.to_string(),
                reason: "only unix:// hosts are supported".to_string(),
            }),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn api_call(&self, endpoint: &str) -> Result<Vec<u8>> {
        debug!("GET {}", endpoint);
        let stream = UnixStream::connect(&self.socket_path).await?;
        self.send_request(stream, endpoint).await
    }

    async fn send_request(&self, mut stream: UnixStream, endpoint: &str) -> Result<Vec<u8>> {
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: docker\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
            endpoint
        );

        stream.write_all(request.as_bytes()).await?;
        self.read_response(stream, endpoint).await
    }

    async fn read_response(&self, mut stream: UnixStream, endpoint: &str) -> Result<Vec<u8>> {
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await?;
        trace!("{} returned {} bytes", endpoint, response.len());

        let (status, body) = parse_response(&response, endpoint)?;
        if !(200..300).contains(&status) {
            let message = match serde_json::from_slice::<ApiMessage>(&body) {
                Ok(api) => api.message,
                Err(_) => String::from_utf8_lossy(&body).trim().to_string(),
            };
            return Err(ExportError::Api {
                endpoint: endpoint.to_string(),
                status,
                message,
            });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let body = self.api_call(endpoint).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl RuntimeQuery for DockerClient {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        let endpoint = if all {
            "/containers/json?all=true"
        } else {
            "/containers/json"
        };
        self.get_json(endpoint).await
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspect> {
        self.get_json(&format!("/containers/{}/json", id)).await
    }

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        self.get_json("/networks").await
    }

    async fn inspect_network(&self, id: &str) -> Result<NetworkInspect> {
        self.get_json(&format!("/networks/{}", id)).await
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        let list: VolumeList = self.get_json("/volumes").await?;
        Ok(list.volumes.unwrap_or_default())
    }

    async fn engine_version(&self) -> Result<EngineVersion> {
        self.get_json("/version").await
    }
}

/// Splits a raw HTTP/1.1 response into its status code and decoded body.
fn parse_response(response: &[u8], endpoint: &str) -> Result<(u16, Vec<u8>)> {
    let header_end = find(response, b"\r\n\r\n")
        .ok_or_else(|| ExportError::protocol(endpoint, "missing header terminator"))?;
    let head = std::str::from_utf8(&response[..header_end])
        .map_err(|_| ExportError::protocol(endpoint, "headers are not UTF-8"))?;
    let body = &response[header_end + 4..];

    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| ExportError::protocol(endpoint, "invalid status line"))?;

    let mut chunked = false;
    let mut content_length = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value.eq_ignore_ascii_case("chunked");
        } else if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().ok();
        }
    }

    if chunked {
        return Ok((status, decode_chunked(body, endpoint)?));
    }
    match content_length {
        Some(length) if length <= body.len() => Ok((status, body[..length].to_vec())),
        Some(_) => Err(ExportError::protocol(endpoint, "truncated body")),
        None => Ok((status, body.to_vec())),
    }
}

fn decode_chunked(mut body: &[u8], endpoint: &str) -> Result<Vec<u8>> {
    let mut decoded = Vec::with_capacity(body.len());
    loop {
        let line_end = find(body, b"\r\n")
            .ok_or_else(|| ExportError::protocol(endpoint, "missing chunk size"))?;
        let size_line = std::str::from_utf8(&body[..line_end])
            .map_err(|_| ExportError::protocol(endpoint, "chunk size is not UTF-8"))?;
        // Chunk extensions follow a ';'.
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| ExportError::protocol(endpoint, format!("bad chunk size {:?}", size_hex)))?;
        body = &body[line_end + 2..];

        if size == 0 {
            return Ok(decoded);
        }
        if body.len() < size {
            return Err(ExportError::protocol(endpoint, "truncated chunk"));
        }
        decoded.extend_from_slice(&body[..size]);
        body = body[size..].strip_prefix(b"\r\n").unwrap_or(&body[size..]);
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
