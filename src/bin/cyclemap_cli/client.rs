#![deny(clippy::all, clippy::pedantic)]

use cyclemap::{
    application::{output::SaveError, pipeline::MapPipeline, pipeline::PipelineError},
    config::{self, LoadError, Settings},
    domain::error::DomainError,
    infra::{error::InfraError, secrets, upstream},
};
use thiserror::Error;

use crate::args::Cli;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    InvalidInput(#[from] DomainError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

#[derive(Clone, Debug)]
pub struct Ctx {
    pub pipeline: MapPipeline,
}

impl Ctx {
    pub fn from_settings(settings: &Settings) -> Result<Self, CliError> {
        let api_key = secrets::resolve_api_key(&settings.renderer)?;
        let client = upstream::build_client()?;
        Ok(Self {
            pipeline: MapPipeline::from_settings(client, settings, api_key),
        })
    }
}

pub fn load_settings(cli: &Cli) -> Result<Settings, CliError> {
    Ok(config::load_with_renderer_overrides(
        cli.config_file.as_deref(),
        &cli.renderer,
    )?)
}
