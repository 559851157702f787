//! Fetch or parse a document, style every feature, then render it.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::Settings,
    domain::{
        error::DocumentError,
        geojson::GeoJson,
        render::{MapDefaults, RECOMMENDED_MAX_DIMENSION, RenderOptions},
        style::LineStyle,
    },
};

use super::{
    fetch::{FetchError, GeoJsonFetcher},
    renderer::{MapRenderer, RenderError, RenderedMap},
};

const SOURCE: &str = "cyclemap::pipeline";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone)]
pub struct MapPipeline {
    fetcher: GeoJsonFetcher,
    renderer: MapRenderer,
    style: LineStyle,
}

impl MapPipeline {
    pub fn new(fetcher: GeoJsonFetcher, renderer: MapRenderer, style: LineStyle) -> Self {
        Self {
            fetcher,
            renderer,
            style,
        }
    }

    pub fn from_settings(client: Client, settings: &Settings, api_key: Option<String>) -> Self {
        let fetcher = GeoJsonFetcher::new(client.clone(), settings.renderer.fetch_timeout);
        let renderer = MapRenderer::new(
            client,
            settings.renderer.endpoint.clone(),
            api_key,
            settings.renderer.render_timeout,
            settings.map.clone(),
        );
        Self::new(fetcher, renderer, settings.style.clone())
    }

    pub fn defaults(&self) -> &MapDefaults {
        self.renderer.defaults()
    }

    pub fn style(&self) -> &LineStyle {
        &self.style
    }

    pub fn has_api_key(&self) -> bool {
        self.renderer.has_api_key()
    }

    /// Apply the configured line style to `document` and render it.
    pub async fn style_and_render(
        &self,
        mut document: GeoJson,
        options: &RenderOptions,
    ) -> Result<RenderedMap, PipelineError> {
        let styled = document.apply_style(&self.style);
        info!(
            target = SOURCE,
            features = styled,
            color = %self.style.color,
            width = self.style.width,
            opacity = self.style.opacity,
            "Applied line style"
        );

        if options.is_oversized() {
            warn!(
                target = SOURCE,
                width = options.width,
                height = options.height,
                limit = RECOMMENDED_MAX_DIMENSION,
                "Large dimensions may cause the rendering service to fail"
            );
        }

        Ok(self.renderer.render(document, options).await?)
    }

    pub async fn generate_from_url(
        &self,
        url: &str,
        options: &RenderOptions,
    ) -> Result<RenderedMap, PipelineError> {
        let document = self.fetcher.fetch(url).await?;
        self.style_and_render(document, options).await
    }

    pub async fn generate_from_upload(
        &self,
        bytes: &[u8],
        options: &RenderOptions,
    ) -> Result<RenderedMap, PipelineError> {
        let document = GeoJson::parse(bytes)?;
        info!(
            target = SOURCE,
            bytes = bytes.len(),
            features = ?document.feature_count(),
            "Parsed uploaded GeoJSON"
        );
        self.style_and_render(document, options).await
    }
}

/// Pipeline wired to explicit endpoints, used by tests and tools.
pub fn pipeline_for(
    endpoint: url::Url,
    api_key: Option<String>,
    timeout: Duration,
    defaults: MapDefaults,
    style: LineStyle,
) -> MapPipeline {
    let client = Client::new();
    MapPipeline::new(
        GeoJsonFetcher::new(client.clone(), timeout),
        MapRenderer::new(client, endpoint, api_key, timeout, defaults),
        style,
    )
}
