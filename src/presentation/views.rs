use crate::application::error::HttpError;
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub title: String,
    pub version: &'static str,
}

impl Default for LayoutChrome {
    fn default() -> Self {
        Self {
            title: "Cycle Map Generator".to_string(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub title: String,
    pub version: &'static str,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            title: chrome.title,
            version: chrome.version,
            content,
        }
    }
}

#[derive(Clone)]
pub struct StyleOption {
    pub name: String,
    pub selected: bool,
}

impl StyleOption {
    /// Known styles plus `current` when it is a custom one, with `current` selected.
    pub fn list(known: &[&str], current: &str) -> Vec<StyleOption> {
        let mut options: Vec<StyleOption> = known
            .iter()
            .map(|name| StyleOption {
                name: (*name).to_string(),
                selected: *name == current,
            })
            .collect();
        if !current.is_empty() && !known.contains(&current) {
            options.push(StyleOption {
                name: current.to_string(),
                selected: true,
            });
        }
        options
    }
}

/// Line style applied to every route, shown for reference on the form.
#[derive(Clone)]
pub struct LineStyleView {
    pub color: String,
    pub width: u32,
    pub opacity: String,
}

pub struct FormContext {
    pub error: Option<String>,
    pub source_is_file: bool,
    pub url: String,
    pub width: String,
    pub height: String,
    pub scale_is_single: bool,
    pub styles: Vec<StyleOption>,
    pub zoom: String,
    pub pitch: String,
    pub bearing: String,
    pub delivery_is_preview: bool,
    pub upload_limit_mib: usize,
    pub api_key_configured: bool,
    pub line_style: LineStyleView,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<FormContext>,
}

pub struct PreviewContext {
    pub data_uri: String,
    pub resolution: String,
    pub effective_resolution: String,
    pub style: String,
    pub size_kib: usize,
}

#[derive(Template)]
#[template(path = "preview.html")]
pub struct PreviewTemplate {
    pub view: LayoutContext<PreviewContext>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_context(error: Option<&str>) -> FormContext {
        FormContext {
            error: error.map(str::to_string),
            source_is_file: false,
            url: "https://example.test/route.geojson".to_string(),
            width: "2048".to_string(),
            height: "2048".to_string(),
            scale_is_single: false,
            styles: StyleOption::list(&["osm-carto", "klokantech-basic"], "klokantech-basic"),
            zoom: "10.5".to_string(),
            pitch: "43".to_string(),
            bearing: "163".to_string(),
            delivery_is_preview: false,
            upload_limit_mib: 10,
            api_key_configured: true,
            line_style: LineStyleView {
                color: "#ff920d".to_string(),
                width: 3,
                opacity: "0.7".to_string(),
            },
        }
    }

    #[test]
    fn custom_style_is_appended_and_selected() {
        let options = StyleOption::list(&["osm-carto"], "my-style");
        assert_eq!(options.len(), 2);
        assert!(!options[0].selected);
        assert_eq!(options[1].name, "my-style");
        assert!(options[1].selected);
    }

    #[test]
    fn index_renders_error_and_escapes_values() {
        let template = IndexTemplate {
            view: LayoutContext::new(
                LayoutChrome::default(),
                form_context(Some("Bad request <400>")),
            ),
        };
        let html = template.render().expect("render");

        assert!(html.contains("Bad request &#60;400&#62;") || html.contains("Bad request &lt;400&gt;"));
        assert!(html.contains(r#"name="width" value="2048""#));
        assert!(html.contains(r#"<option value="klokantech-basic" selected>"#));
    }

    #[test]
    fn preview_embeds_the_data_uri() {
        let template = PreviewTemplate {
            view: LayoutContext::new(
                LayoutChrome::default(),
                PreviewContext {
                    data_uri: "data:image/png;base64,iVBORw0KGgo=".to_string(),
                    resolution: "800x600".to_string(),
                    effective_resolution: "1600x1200".to_string(),
                    style: "osm-carto".to_string(),
                    size_kib: 1,
                },
            ),
        };
        let html = template.render().expect("render");

        assert!(html.contains(r#"src="data:image/png;base64,iVBORw0KGgo=""#));
        assert!(html.contains("1600x1200"));
    }

    #[test]
    fn preview_escapes_hostile_content_types() {
        let template = PreviewTemplate {
            view: LayoutContext::new(
                LayoutChrome::default(),
                PreviewContext {
                    data_uri: r#"data:image/png" onerror="alert(1);base64,AAAA"#.to_string(),
                    resolution: "800x600".to_string(),
                    effective_resolution: "800x600".to_string(),
                    style: "osm-carto".to_string(),
                    size_kib: 1,
                },
            ),
        };
        let html = template.render().expect("render");

        assert!(!html.contains(r#"" onerror=""#));
    }
}
