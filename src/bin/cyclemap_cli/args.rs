//! Command-line surface for `cyclemap-cli`.

#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use clap::Parser;
use cyclemap::config::RendererOverrides;

#[derive(Parser, Debug)]
#[command(
    name = "cyclemap-cli",
    version,
    about = "Render a cycle route GeoJSON into a static map image",
    long_about = None
)]
pub struct Cli {
    /// URL of the GeoJSON document to render.
    #[arg(long, value_name = "URL")]
    pub url: String,

    /// Where to write the PNG image. The directory must exist.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: PathBuf,

    /// Image width in pixels (defaults to the configured map width).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: Option<u32>,

    /// Image height in pixels (defaults to the configured map height).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: Option<u32>,

    /// Pixel density: 1 for standard, 2 for high resolution.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub scale: Option<u8>,

    /// Map style name, e.g. osm-carto or dark-matter.
    #[arg(long)]
    pub style: Option<String>,

    /// Camera zoom level.
    #[arg(long, allow_negative_numbers = true)]
    pub zoom: Option<f64>,

    /// Camera pitch in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub pitch: Option<f64>,

    /// Camera bearing in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub bearing: Option<f64>,

    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "CYCLEMAP_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub renderer: RendererOverrides,
}
