//! cyclemap-cli: fetch a GeoJSON route, style it, render it and save the image.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod generate;
mod print;

use std::process;

use clap::Parser;
use cyclemap::infra::telemetry;

use args::Cli;
use client::{CliError, Ctx, load_settings};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli).await {
        eprintln!("ERROR: {err}");
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let settings = load_settings(cli)?;
    telemetry::init(&settings.logging)?;

    let ctx = Ctx::from_settings(&settings)?;
    let summary = generate::handle(&ctx, cli).await?;
    print::summary(&summary);
    Ok(())
}
