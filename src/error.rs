use thiserror::Error;

/// Errors raised while querying the engine and producing a compose file.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot connect to the Docker daemon at {host}: {reason}")]
    Connect { host: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Docker API error ({status}) on {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Malformed response from {endpoint}: {reason}")]
    Protocol { endpoint: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unparseable engine version {raw:?}: {source}")]
    VersionParse {
        raw: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

impl ExportError {
    pub(crate) fn protocol(endpoint: &str, reason: impl Into<String>) -> Self {
        ExportError::Protocol {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
