#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use cyclemap::{
    application::output::save_image,
    domain::render::{RenderOptions, Resolution, ScaleFactor},
};

use crate::{
    args::Cli,
    client::{CliError, Ctx},
};

/// What was written, for the closing summary.
#[derive(Debug)]
pub struct Summary {
    pub path: PathBuf,
    pub bytes: usize,
    pub resolution: Resolution,
    pub scale_factor: ScaleFactor,
    pub effective_resolution: Resolution,
    pub style: String,
}

pub fn options_from_cli(ctx: &Ctx, cli: &Cli) -> Result<RenderOptions, CliError> {
    let defaults = ctx.pipeline.defaults();
    let scale_factor = match cli.scale {
        Some(value) => ScaleFactor::try_from(value)?,
        None => defaults.scale_factor,
    };

    let options = RenderOptions::new(
        cli.width.unwrap_or(defaults.width),
        cli.height.unwrap_or(defaults.height),
        scale_factor,
    )?
    .with_style(cli.style.clone())
    .with_camera(cli.zoom, cli.pitch, cli.bearing);
    Ok(options)
}

pub async fn handle(ctx: &Ctx, cli: &Cli) -> Result<Summary, CliError> {
    let options = options_from_cli(ctx, cli)?;
    let map = ctx.pipeline.generate_from_url(&cli.url, &options).await?;
    save_image(&map.bytes, &cli.output).await?;

    Ok(Summary {
        path: cli.output.clone(),
        bytes: map.bytes.len(),
        resolution: map.resolution,
        scale_factor: options.scale_factor,
        effective_resolution: map.effective_resolution,
        style: map.style,
    })
}
