//! Validation of the `/generate` form.

use std::str::FromStr;

use bytes::Bytes;

use crate::domain::{
    error::DomainError,
    render::{MapDefaults, RenderOptions, ScaleFactor},
};

/// Raw text values as submitted, echoed back when the form is re-rendered.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    pub source_type: String,
    pub url: String,
    pub width: String,
    pub height: String,
    pub scale: String,
    pub style: String,
    pub zoom: String,
    pub pitch: String,
    pub bearing: String,
    pub delivery: String,
}

impl FormValues {
    /// Values shown on a fresh form.
    pub fn from_defaults(defaults: &MapDefaults) -> Self {
        Self {
            source_type: SourceKind::Url.as_str().to_string(),
            url: String::new(),
            width: defaults.width.to_string(),
            height: defaults.height.to_string(),
            scale: defaults.scale_factor.to_string(),
            style: defaults.style.clone(),
            zoom: format_optional(defaults.zoom),
            pitch: format_optional(defaults.pitch),
            bearing: format_optional(defaults.bearing),
            delivery: Delivery::Download.as_str().to_string(),
        }
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateForm {
    pub values: FormValues,
    pub file: Option<UploadedFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Url,
    File,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Url => "url",
            SourceKind::File => "file",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Download,
    Preview,
}

impl Delivery {
    pub fn as_str(self) -> &'static str {
        match self {
            Delivery::Download => "download",
            Delivery::Preview => "preview",
        }
    }
}

#[derive(Debug, Clone)]
pub enum GeoJsonSource {
    Url(String),
    Upload(UploadedFile),
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub source: GeoJsonSource,
    pub options: RenderOptions,
    pub delivery: Delivery,
}

impl GenerateForm {
    pub fn validate(&self) -> Result<GenerateRequest, DomainError> {
        let values = &self.values;

        let source_kind = match values.source_type.trim() {
            "" | "url" => SourceKind::Url,
            "file" => SourceKind::File,
            other => {
                return Err(DomainError::validation(format!(
                    "Unknown GeoJSON source `{other}`."
                )));
            }
        };

        let source = match source_kind {
            SourceKind::Url => {
                let url = values.url.trim();
                if url.is_empty() {
                    return Err(DomainError::validation("Please provide a GeoJSON URL."));
                }
                GeoJsonSource::Url(url.to_string())
            }
            SourceKind::File => match self.file.as_ref() {
                Some(file) if !file.bytes.is_empty() => GeoJsonSource::Upload(file.clone()),
                _ => return Err(DomainError::validation("Please upload a GeoJSON file.")),
            },
        };

        let width = parse_dimension(&values.width)?;
        let height = parse_dimension(&values.height)?;
        let scale = parse_scale(&values.scale)?;

        let options = RenderOptions::new(width, height, scale)?
            .with_style(Some(values.style.clone()))
            .with_camera(
                parse_optional::<f64>(&values.zoom, "Zoom")?,
                parse_optional::<f64>(&values.pitch, "Pitch")?,
                parse_optional::<f64>(&values.bearing, "Bearing")?,
            );

        let delivery = match values.delivery.trim() {
            "" | "download" => Delivery::Download,
            "preview" => Delivery::Preview,
            other => {
                return Err(DomainError::validation(format!(
                    "Unknown delivery mode `{other}`."
                )));
            }
        };

        Ok(GenerateRequest {
            source,
            options,
            delivery,
        })
    }
}

fn parse_dimension(raw: &str) -> Result<u32, DomainError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(DomainError::validation(
            "Width and height must be positive integers.",
        )),
    }
}

fn parse_scale(raw: &str) -> Result<ScaleFactor, DomainError> {
    let value = raw
        .trim()
        .parse::<u8>()
        .map_err(|_| DomainError::validation("Scale factor must be 1 or 2."))?;
    ScaleFactor::try_from(value)
}

fn parse_optional<T: FromStr>(raw: &str, label: &str) -> Result<Option<T>, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| DomainError::validation(format!("{label} must be a number.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_form() -> GenerateForm {
        GenerateForm {
            values: FormValues {
                url: "https://example.test/route.geojson".to_string(),
                ..FormValues::from_defaults(&MapDefaults::default())
            },
            file: None,
        }
    }

    #[test]
    fn defaults_produce_a_valid_download_request() {
        let request = url_form().validate().expect("valid");

        assert!(matches!(request.source, GeoJsonSource::Url(ref url) if url.ends_with("route.geojson")));
        assert_eq!(request.delivery, Delivery::Download);
        assert_eq!(request.options.width, 2048);
        assert_eq!(request.options.scale_factor, ScaleFactor::Double);
        assert_eq!(request.options.zoom, Some(10.5));
    }

    #[test]
    fn blank_camera_fields_fall_back() {
        let mut form = url_form();
        form.values.zoom.clear();
        form.values.pitch = "  ".to_string();
        form.values.style.clear();

        let request = form.validate().expect("valid");
        assert_eq!(request.options.zoom, None);
        assert_eq!(request.options.pitch, None);
        assert_eq!(request.options.style, None);
    }

    #[test]
    fn missing_url_is_reported() {
        let mut form = url_form();
        form.values.url.clear();
        let err = form.validate().expect_err("missing url");
        assert_eq!(err.to_string(), "Please provide a GeoJSON URL.");
    }

    #[test]
    fn file_source_requires_an_upload() {
        let mut form = url_form();
        form.values.source_type = "file".to_string();
        let err = form.validate().expect_err("missing file");
        assert_eq!(err.to_string(), "Please upload a GeoJSON file.");

        form.file = Some(UploadedFile {
            filename: Some("route.geojson".to_string()),
            bytes: Bytes::from_static(b"{\"type\":\"FeatureCollection\"}"),
        });
        let request = form.validate().expect("upload accepted");
        assert!(matches!(request.source, GeoJsonSource::Upload(_)));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut form = url_form();
        form.values.width = "wide".to_string();
        assert!(form.validate().is_err());

        let mut form = url_form();
        form.values.height = "0".to_string();
        assert!(form.validate().is_err());

        let mut form = url_form();
        form.values.scale = "3".to_string();
        assert!(form.validate().is_err());

        let mut form = url_form();
        form.values.bearing = "north".to_string();
        let err = form.validate().expect_err("bad bearing");
        assert_eq!(err.to_string(), "Bearing must be a number.");
    }

    #[test]
    fn preview_delivery_is_recognised() {
        let mut form = url_form();
        form.values.delivery = "preview".to_string();
        assert_eq!(form.validate().expect("valid").delivery, Delivery::Preview);
    }
}
