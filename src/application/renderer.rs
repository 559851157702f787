//! Calls the hosted static-map API with a styled document.

use std::time::{Duration, Instant};

use bytes::Bytes;
use cyclemap_api_types::StaticMapRequest;
use metrics::{counter, histogram};
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::domain::{
    geojson::GeoJson,
    render::{MapDefaults, RenderOptions, Resolution, ResolvedRender},
};

const SOURCE: &str = "cyclemap::render";
const API_KEY_PARAM: &str = "apiKey";
const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Map rendering API key is not configured.")]
    MissingApiKey,
    #[error("Network connection failed while generating map.")]
    Connection(#[source] reqwest::Error),
    #[error("Map generation timed out. Try a smaller image size.")]
    Timeout(#[source] reqwest::Error),
    #[error("Invalid API key (401). Please check your API key.")]
    Unauthorized,
    #[error("Bad request (400). Check your GeoJSON data or parameters.")]
    BadRequest { body: String },
    #[error("Server error ({status}). Try reducing image size or try again later.")]
    Server { status: u16, body: String },
    #[error("HTTP error {status} from the map rendering service.")]
    Status { status: u16, body: String },
    #[error("Unexpected error while generating map.")]
    Unexpected(#[source] reqwest::Error),
}

impl RenderError {
    fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => RenderError::Unauthorized,
            StatusCode::BAD_REQUEST => RenderError::BadRequest { body },
            status if status.is_server_error() => RenderError::Server {
                status: status.as_u16(),
                body,
            },
            status => RenderError::Status {
                status: status.as_u16(),
                body,
            },
        }
    }

    /// The request URL carries the API key, so it is stripped before the error is kept.
    fn from_transport(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            RenderError::Timeout(err)
        } else if err.is_connect() {
            RenderError::Connection(err)
        } else {
            RenderError::Unexpected(err)
        }
    }

    /// Response body returned by the service, when it sent one.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            RenderError::BadRequest { body }
            | RenderError::Server { body, .. }
            | RenderError::Status { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            RenderError::MissingApiKey => "missing_api_key",
            RenderError::Connection(_) => "connection",
            RenderError::Timeout(_) => "timeout",
            RenderError::Unauthorized => "unauthorized",
            RenderError::BadRequest { .. } => "bad_request",
            RenderError::Server { .. } => "server_error",
            RenderError::Status { .. } => "http_error",
            RenderError::Unexpected(_) => "unexpected",
        }
    }
}

/// Image returned by the rendering service.
#[derive(Debug, Clone)]
pub struct RenderedMap {
    pub bytes: Bytes,
    pub content_type: String,
    pub resolution: Resolution,
    pub effective_resolution: Resolution,
    pub style: String,
}

#[derive(Debug, Clone)]
pub struct MapRenderer {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    timeout: Duration,
    defaults: MapDefaults,
}

impl MapRenderer {
    pub fn new(
        client: Client,
        endpoint: Url,
        api_key: Option<String>,
        timeout: Duration,
        defaults: MapDefaults,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            timeout,
            defaults,
        }
    }

    pub fn defaults(&self) -> &MapDefaults {
        &self.defaults
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Render `document` with `options`, falling back to the configured defaults.
    pub async fn render(
        &self,
        document: GeoJson,
        options: &RenderOptions,
    ) -> Result<RenderedMap, RenderError> {
        let resolved = options.resolve(&self.defaults);
        let result = self.render_resolved(document, &resolved).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.outcome(),
        };
        counter!("cyclemap_render_total", "outcome" => outcome).increment(1);
        result
    }

    async fn render_resolved(
        &self,
        document: GeoJson,
        resolved: &ResolvedRender,
    ) -> Result<RenderedMap, RenderError> {
        let api_key = self.api_key.as_deref().ok_or(RenderError::MissingApiKey)?;

        let effective = resolved.effective_resolution();
        info!(
            target = SOURCE,
            width = resolved.width,
            height = resolved.height,
            scale = resolved.scale_factor.get(),
            effective = %effective,
            style = %resolved.style,
            zoom = ?resolved.zoom,
            pitch = ?resolved.pitch,
            bearing = ?resolved.bearing,
            customizations = resolved.style_customization.len(),
            "Generating map from GeoJSON data"
        );

        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair(API_KEY_PARAM, api_key);

        let body = build_request(document, resolved);
        let started = Instant::now();
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(RenderError::from_transport)?;
        histogram!("cyclemap_render_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        let status = response.status();
        if !status.is_success() {
            let text = match response.text().await {
                Ok(text) => text,
                Err(err) => {
                    warn!(
                        target = SOURCE,
                        status = status.as_u16(),
                        error = %err.without_url(),
                        "Failed to read the rendering service error body"
                    );
                    String::new()
                }
            };
            let err = RenderError::from_status(status, text);
            warn!(
                target = SOURCE,
                status = status.as_u16(),
                body = err.upstream_body().unwrap_or(""),
                "Rendering service rejected the request"
            );
            return Err(err);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.starts_with("image/"))
            .unwrap_or(DEFAULT_IMAGE_CONTENT_TYPE)
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(RenderError::from_transport)?;

        histogram!("cyclemap_render_bytes").record(bytes.len() as f64);
        info!(
            target = SOURCE,
            bytes = bytes.len(),
            "Map generated"
        );

        Ok(RenderedMap {
            bytes,
            content_type,
            resolution: Resolution {
                width: resolved.width,
                height: resolved.height,
            },
            effective_resolution: effective,
            style: resolved.style.clone(),
        })
    }
}

/// Assemble the JSON body sent to the rendering service.
pub fn build_request(document: GeoJson, resolved: &ResolvedRender) -> StaticMapRequest {
    let style_customization =
        (!resolved.style_customization.is_empty()).then(|| resolved.style_customization.clone());

    StaticMapRequest {
        geojson: document.into_value(),
        width: resolved.width,
        height: resolved.height,
        scale_factor: resolved.scale_factor.get(),
        style: resolved.style.clone(),
        bearing: resolved.bearing,
        pitch: resolved.pitch,
        zoom: resolved.zoom,
        style_customization,
    }
}
