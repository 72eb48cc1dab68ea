// Native client for the command center: HTTP auth gateway and the telemetry socket feed.

mod feed;
mod gateway;

use thiserror::Error;

pub use feed::TelemetryFeed;
pub use gateway::{AdminStats, HttpGateway};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    InvalidUrl(String),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("socket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("gave up after {attempts} connection attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Normalizes a server base url, accepting a bare `host:port`.
pub(crate) fn base_url(server: &str) -> Result<String, ClientError> {
    let trimmed = server.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientError::InvalidUrl(server.to_string()));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else if trimmed.contains("://") {
        Err(ClientError::InvalidUrl(server.to_string()))
    } else {
        Ok(format!("http://{trimmed}"))
    }
}
