use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::Multipart;
use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::{info, warn};

use crate::{
    application::{
        error::HttpError,
        pipeline::{MapPipeline, PipelineError},
        renderer::RenderedMap,
    },
    domain::render::KNOWN_MAP_STYLES,
    presentation::views::{
        FormContext, IndexTemplate, LayoutChrome, LayoutContext, LineStyleView, PreviewContext,
        PreviewTemplate, StyleOption, render_template_response,
    },
};

use super::{
    form::{Delivery, FormValues, GenerateRequest, GeoJsonSource, SourceKind},
    middleware::{log_responses, set_request_context},
    multipart::read_generate_form,
};

const SOURCE: &str = "infra::http::public";
const DOWNLOAD_DISPOSITION: &str = "attachment; filename=\"cycle_map.png\"";

#[derive(Clone)]
pub struct HttpState {
    pub pipeline: Arc<MapPipeline>,
    pub chrome: LayoutChrome,
    pub upload_limit_bytes: usize,
}

impl HttpState {
    pub fn new(pipeline: MapPipeline, upload_limit_bytes: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            chrome: LayoutChrome::default(),
            upload_limit_bytes,
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    let upload_body_limit = state.upload_limit_bytes;

    Router::new()
        .route("/", get(index))
        .route(
            "/generate",
            post(generate).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/_health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn index(State(state): State<HttpState>) -> Response {
    let values = FormValues::from_defaults(state.pipeline.defaults());
    render_form(&state, &values, None)
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn generate(State(state): State<HttpState>, mut multipart: Multipart) -> Response {
    let form = match read_generate_form(&mut multipart, state.pipeline.defaults()).await {
        Ok(form) => form,
        Err(err) => return err.into_http_error(state.upload_limit_bytes).into_response(),
    };

    let request = match form.validate() {
        Ok(request) => request,
        Err(err) => {
            warn!(target = SOURCE, error = %err, "rejected map form");
            return render_form(&state, &form.values, Some(err.to_string()));
        }
    };

    match run_pipeline(&state, &request).await {
        Ok(map) => match request.delivery {
            Delivery::Download => build_download_response(map),
            Delivery::Preview => render_preview(&state, &map),
        },
        Err(err) => {
            warn!(target = SOURCE, error = %err, "map generation failed");
            render_form(&state, &form.values, Some(err.to_string()))
        }
    }
}

async fn run_pipeline(
    state: &HttpState,
    request: &GenerateRequest,
) -> Result<RenderedMap, PipelineError> {
    match &request.source {
        GeoJsonSource::Url(url) => {
            state
                .pipeline
                .generate_from_url(url, &request.options)
                .await
        }
        GeoJsonSource::Upload(file) => {
            info!(
                target = SOURCE,
                filename = file.filename.as_deref().unwrap_or(""),
                bytes = file.bytes.len(),
                "Received GeoJSON upload"
            );
            state
                .pipeline
                .generate_from_upload(&file.bytes, &request.options)
                .await
        }
    }
}

fn render_form(state: &HttpState, values: &FormValues, error: Option<String>) -> Response {
    let style = state.pipeline.style();
    let content = FormContext {
        error,
        source_is_file: values.source_type.trim() == SourceKind::File.as_str(),
        url: values.url.clone(),
        width: values.width.clone(),
        height: values.height.clone(),
        scale_is_single: values.scale.trim() == "1",
        styles: StyleOption::list(KNOWN_MAP_STYLES, values.style.trim()),
        zoom: values.zoom.clone(),
        pitch: values.pitch.clone(),
        bearing: values.bearing.clone(),
        delivery_is_preview: values.delivery.trim() == Delivery::Preview.as_str(),
        upload_limit_mib: state.upload_limit_bytes.div_ceil(1_048_576),
        api_key_configured: state.pipeline.has_api_key(),
        line_style: LineStyleView {
            color: style.color.clone(),
            width: style.width,
            opacity: style.opacity.to_string(),
        },
    };

    let view = LayoutContext::new(state.chrome.clone(), content);
    render_template_response(IndexTemplate { view }, StatusCode::OK)
}

fn render_preview(state: &HttpState, map: &RenderedMap) -> Response {
    let encoded = STANDARD.encode(&map.bytes);
    let content = PreviewContext {
        data_uri: format!("data:{};base64,{encoded}", map.content_type),
        resolution: map.resolution.to_string(),
        effective_resolution: map.effective_resolution.to_string(),
        style: map.style.clone(),
        size_kib: map.bytes.len().div_ceil(1024),
    };

    let view = LayoutContext::new(state.chrome.clone(), content);
    render_template_response(PreviewTemplate { view }, StatusCode::OK)
}

fn build_download_response(map: RenderedMap) -> Response {
    let content_type = match HeaderValue::from_str(&map.content_type) {
        Ok(value) => value,
        Err(err) => {
            return HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to build download",
                err.to_string(),
            )
            .into_response();
        }
    };
    let length = map.bytes.len();

    let mut response = Response::new(Body::from(map.bytes));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_static(DOWNLOAD_DISPOSITION),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::render::Resolution;
    use bytes::Bytes;

    #[test]
    fn download_response_is_an_attachment() {
        let response = build_download_response(RenderedMap {
            bytes: Bytes::from_static(b"png"),
            content_type: "image/png".to_string(),
            resolution: Resolution {
                width: 10,
                height: 10,
            },
            effective_resolution: Resolution {
                width: 20,
                height: 20,
            },
            style: "osm-carto".to_string(),
        });

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"cycle_map.png\""
        );
        assert_eq!(response.headers()[CONTENT_LENGTH], "3");
        assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
    }
}
