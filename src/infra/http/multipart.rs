//! Multipart payload parsing for `/generate`.

use axum::http::StatusCode;
use axum_extra::extract::{Multipart, multipart::MultipartError};
use thiserror::Error;
use tracing::error;

use crate::{application::error::HttpError, domain::render::MapDefaults};

use super::form::{FormValues, GenerateForm, UploadedFile};

const SOURCE_BASE: &str = "infra::http::generate_form";

#[derive(Debug, Error)]
pub(super) enum FormPayloadError {
    #[error("upload exceeds the configured request limit")]
    PayloadTooLarge,
    #[error("malformed multipart body")]
    InvalidFormData,
    #[error("failed to read multipart body: {detail}")]
    Read { detail: String },
}

impl FormPayloadError {
    pub(super) fn into_http_error(self, limit_bytes: usize) -> HttpError {
        match self {
            FormPayloadError::PayloadTooLarge => {
                let limit_mib = limit_bytes.div_ceil(1_048_576);
                HttpError::new(
                    SOURCE_BASE,
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Upload is too large",
                    format!("request body exceeds {limit_mib} MiB"),
                )
            }
            FormPayloadError::InvalidFormData => HttpError::from_error(
                SOURCE_BASE,
                StatusCode::BAD_REQUEST,
                "Invalid form submission",
                &self,
            ),
            FormPayloadError::Read { .. } => HttpError::from_error(
                SOURCE_BASE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read form submission",
                &self,
            ),
        }
    }
}

/// Collect the form fields; fields the client omitted keep their configured defaults.
pub(super) async fn read_generate_form(
    multipart: &mut Multipart,
    defaults: &MapDefaults,
) -> Result<GenerateForm, FormPayloadError> {
    let mut values = FormValues::from_defaults(defaults);
    let mut file = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                let status = err.status();
                error!(
                    target = SOURCE_BASE,
                    status = status.as_u16(),
                    error = %err,
                    "failed to read multipart payload"
                );
                return Err(match status {
                    StatusCode::PAYLOAD_TOO_LARGE => FormPayloadError::PayloadTooLarge,
                    StatusCode::BAD_REQUEST => FormPayloadError::InvalidFormData,
                    _ => FormPayloadError::Read {
                        detail: err.to_string(),
                    },
                });
            }
        };

        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "file" {
            let filename = field
                .file_name()
                .map(str::to_string)
                .filter(|value| !value.trim().is_empty());
            let bytes = field.bytes().await.map_err(field_error)?;
            if !bytes.is_empty() {
                file = Some(UploadedFile { filename, bytes });
            }
            continue;
        }

        let slot = match name.as_str() {
            "source_type" => &mut values.source_type,
            "url" => &mut values.url,
            "width" => &mut values.width,
            "height" => &mut values.height,
            "scale" => &mut values.scale,
            "style" => &mut values.style,
            "zoom" => &mut values.zoom,
            "pitch" => &mut values.pitch,
            "bearing" => &mut values.bearing,
            "delivery" => &mut values.delivery,
            _ => continue,
        };
        *slot = field.text().await.map_err(field_error)?;
    }

    Ok(GenerateForm { values, file })
}

fn field_error(err: MultipartError) -> FormPayloadError {
    match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => FormPayloadError::PayloadTooLarge,
        _ => FormPayloadError::InvalidFormData,
    }
}
