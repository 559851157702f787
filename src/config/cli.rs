use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the cyclemap server binary.
#[derive(Debug, Parser)]
#[command(name = "cyclemap", version, about = "Cycle route map poster server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "CYCLEMAP_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the web form and rendering endpoint.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

/// Overrides shared by every entry point that talks to the rendering service.
#[derive(Debug, Args, Default, Clone)]
pub struct RendererOverrides {
    /// Override the static map endpoint URL.
    #[arg(long = "renderer-endpoint", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Override the path of the file holding the rendering API key.
    #[arg(long = "api-key-file", value_name = "PATH")]
    pub api_key_file: Option<PathBuf>,

    /// Override the GeoJSON download timeout.
    #[arg(long = "fetch-timeout-seconds", value_name = "SECONDS")]
    pub fetch_timeout_seconds: Option<u64>,

    /// Override the map rendering timeout.
    #[arg(long = "render-timeout-seconds", value_name = "SECONDS")]
    pub render_timeout_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub renderer: RendererOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the maximum request size for GeoJSON uploads in bytes.
    #[arg(long = "uploads-max-request-bytes", value_name = "BYTES")]
    pub uploads_max_request_bytes: Option<u64>,
}
