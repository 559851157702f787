//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::NonZeroU64,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::{
    render::{
        DEFAULT_BEARING, DEFAULT_HEIGHT, DEFAULT_MAP_STYLE, DEFAULT_PITCH, DEFAULT_WIDTH,
        DEFAULT_ZOOM, MapDefaults, ScaleFactor,
    },
    style::{DEFAULT_LINE_COLOR, DEFAULT_LINE_OPACITY, DEFAULT_LINE_WIDTH, LineStyle},
};

mod cli;
#[cfg(test)]
mod tests;

pub use cli::{CliArgs, Command, RendererOverrides, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "cyclemap";
const ENV_PREFIX: &str = "CYCLEMAP";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_RENDERER_ENDPOINT: &str = "https://maps.geoapify.com/v1/staticmap";
const DEFAULT_API_KEY_FILE: &str = "secrets/api_key";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SCALE: u8 = 2;
const DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES: u64 = 10 * 1024 * 1024;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub renderer: RendererSettings,
    pub style: LineStyle,
    pub map: MapDefaults,
    pub uploads: UploadSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RendererSettings {
    pub endpoint: Url,
    /// Inline key; takes precedence over `api_key_file`.
    pub api_key: Option<String>,
    pub api_key_file: PathBuf,
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_request_bytes: NonZeroU64,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings for the server binary using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut raw = load_raw(cli.config_file.as_deref())?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Load settings for clients that only need the renderer overrides.
pub fn load_with_renderer_overrides(
    config_file: Option<&Path>,
    overrides: &RendererOverrides,
) -> Result<Settings, LoadError> {
    let mut raw = load_raw(config_file)?;
    raw.apply_renderer_overrides(overrides);
    Settings::from_raw(raw)
}

fn load_raw(config_file: Option<&Path>) -> Result<RawSettings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    Ok(builder.build()?.try_deserialize()?)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    renderer: RawRendererSettings,
    style: RawStyleSettings,
    map: RawMapSettings,
    uploads: RawUploadSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(limit) = overrides.uploads_max_request_bytes {
            self.uploads.max_request_bytes = Some(limit);
        }

        self.apply_renderer_overrides(&overrides.renderer);
    }

    fn apply_renderer_overrides(&mut self, overrides: &RendererOverrides) {
        if let Some(endpoint) = overrides.endpoint.as_ref() {
            self.renderer.endpoint = Some(endpoint.clone());
        }
        if let Some(path) = overrides.api_key_file.as_ref() {
            self.renderer.api_key_file = Some(path.clone());
        }
        if let Some(seconds) = overrides.fetch_timeout_seconds {
            self.renderer.fetch_timeout_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.render_timeout_seconds {
            self.renderer.render_timeout_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            renderer,
            style,
            map,
            uploads,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            renderer: build_renderer_settings(renderer)?,
            style: build_style_settings(style)?,
            map: build_map_settings(map)?,
            uploads: build_upload_settings(uploads)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_renderer_settings(renderer: RawRendererSettings) -> Result<RendererSettings, LoadError> {
    let endpoint_value = renderer
        .endpoint
        .unwrap_or_else(|| DEFAULT_RENDERER_ENDPOINT.to_string());
    let endpoint = Url::parse(endpoint_value.trim()).map_err(|err| {
        LoadError::invalid("renderer.endpoint", format!("invalid URL: {err}"))
    })?;

    let api_key = renderer.api_key.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let api_key_file = renderer
        .api_key_file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_API_KEY_FILE));
    if api_key_file.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "renderer.api_key_file",
            "path must not be empty",
        ));
    }

    let fetch_timeout = positive_seconds(
        renderer
            .fetch_timeout_seconds
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
        "renderer.fetch_timeout_seconds",
    )?;
    let render_timeout = positive_seconds(
        renderer
            .render_timeout_seconds
            .unwrap_or(DEFAULT_RENDER_TIMEOUT_SECS),
        "renderer.render_timeout_seconds",
    )?;

    Ok(RendererSettings {
        endpoint,
        api_key,
        api_key_file,
        fetch_timeout,
        render_timeout,
    })
}

fn build_style_settings(style: RawStyleSettings) -> Result<LineStyle, LoadError> {
    let color = style
        .line_color
        .unwrap_or_else(|| DEFAULT_LINE_COLOR.to_string());
    if color.trim().is_empty() {
        return Err(LoadError::invalid(
            "style.line_color",
            "color must not be empty",
        ));
    }

    let width = style.line_width.unwrap_or(DEFAULT_LINE_WIDTH);
    if width == 0 {
        return Err(LoadError::invalid(
            "style.line_width",
            "must be greater than zero",
        ));
    }

    let opacity = style.line_opacity.unwrap_or(DEFAULT_LINE_OPACITY);
    if !(0.0..=1.0).contains(&opacity) {
        return Err(LoadError::invalid(
            "style.line_opacity",
            "must be between 0 and 1",
        ));
    }

    Ok(LineStyle {
        color: color.trim().to_string(),
        width,
        opacity,
    })
}

fn build_map_settings(map: RawMapSettings) -> Result<MapDefaults, LoadError> {
    let style = map
        .style
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_MAP_STYLE.to_string());

    let width = map.width.unwrap_or(DEFAULT_WIDTH);
    let height = map.height.unwrap_or(DEFAULT_HEIGHT);
    if width == 0 {
        return Err(LoadError::invalid("map.width", "must be greater than zero"));
    }
    if height == 0 {
        return Err(LoadError::invalid("map.height", "must be greater than zero"));
    }

    let scale_factor = ScaleFactor::try_from(map.scale.unwrap_or(DEFAULT_SCALE))
        .map_err(|err| LoadError::invalid("map.scale", err.to_string()))?;

    Ok(MapDefaults {
        style,
        width,
        height,
        scale_factor,
        zoom: map.zoom.or(Some(DEFAULT_ZOOM)),
        pitch: map.pitch.or(Some(DEFAULT_PITCH)),
        bearing: map.bearing.or(Some(DEFAULT_BEARING)),
        style_customization: map.style_customization.unwrap_or_default(),
    })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let max_request_bytes_value = uploads
        .max_request_bytes
        .unwrap_or(DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("uploads.max_request_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_request_bytes_value).map_err(|_| {
        LoadError::invalid(
            "uploads.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(UploadSettings { max_request_bytes })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRendererSettings {
    endpoint: Option<String>,
    api_key: Option<String>,
    api_key_file: Option<PathBuf>,
    fetch_timeout_seconds: Option<u64>,
    render_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStyleSettings {
    line_color: Option<String>,
    line_width: Option<u32>,
    line_opacity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawMapSettings {
    style: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    scale: Option<u8>,
    zoom: Option<f64>,
    pitch: Option<f64>,
    bearing: Option<f64>,
    style_customization: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    max_request_bytes: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn positive_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
