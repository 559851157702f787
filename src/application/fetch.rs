//! Download GeoJSON documents from user-supplied URLs.

use std::time::Duration;

use metrics::counter;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::domain::{error::DocumentError, geojson::GeoJson};

const SOURCE: &str = "cyclemap::fetch";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid GeoJSON URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Network connection failed. Please check your internet connection.")]
    Connection(#[source] reqwest::Error),
    #[error("Request timed out. The server took too long to respond.")]
    Timeout(#[source] reqwest::Error),
    #[error("GeoJSON file not found (404). Please check the URL.")]
    NotFound,
    #[error("Unauthorized (401). Authentication required.")]
    Unauthorized,
    #[error("Server error ({status}). Please try again later.")]
    Server { status: u16 },
    #[error("HTTP error {status} while fetching GeoJSON.")]
    Status { status: u16 },
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Unexpected error while fetching GeoJSON: {0}")]
    Unexpected(#[source] reqwest::Error),
}

impl FetchError {
    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => FetchError::NotFound,
            StatusCode::UNAUTHORIZED => FetchError::Unauthorized,
            status if status.is_server_error() => FetchError::Server {
                status: status.as_u16(),
            },
            status => FetchError::Status {
                status: status.as_u16(),
            },
        }
    }

    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err)
        } else if err.is_connect() {
            FetchError::Connection(err)
        } else {
            FetchError::Unexpected(err)
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl { .. } => "invalid_url",
            FetchError::Connection(_) => "connection",
            FetchError::Timeout(_) => "timeout",
            FetchError::NotFound => "not_found",
            FetchError::Unauthorized => "unauthorized",
            FetchError::Server { .. } => "server_error",
            FetchError::Status { .. } => "http_error",
            FetchError::Document(_) => "invalid_document",
            FetchError::Unexpected(_) => "unexpected",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeoJsonFetcher {
    client: Client,
    timeout: Duration,
}

impl GeoJsonFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn fetch(&self, url: &str) -> Result<GeoJson, FetchError> {
        let result = self.fetch_inner(url).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.outcome(),
        };
        counter!("cyclemap_fetch_total", "outcome" => outcome).increment(1);
        result
    }

    async fn fetch_inner(&self, raw_url: &str) -> Result<GeoJson, FetchError> {
        let url = parse_source_url(raw_url)?;
        info!(target = SOURCE, url = %url, "Fetching GeoJSON data");

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                target = SOURCE,
                url = %url,
                status = status.as_u16(),
                "GeoJSON source answered with an error status"
            );
            return Err(FetchError::from_status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(FetchError::from_transport)?;
        let document = GeoJson::parse(&body)?;

        info!(
            target = SOURCE,
            features = ?document.feature_count(),
            kind = document.kind().unwrap_or("unknown"),
            "GeoJSON data loaded"
        );
        Ok(document)
    }
}

fn parse_source_url(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|err| FetchError::InvalidUrl {
        url: trimmed.to_string(),
        reason: err.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}
