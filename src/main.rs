mod adapter;
mod config;
mod error;
mod services;
mod template;
mod util;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    adapter::ssh::SshConnector,
    config::{cli::Args, read_config, Settings},
    services::upload::upload,
    template::TemplateVars,
};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let base = match args.config.as_deref() {
        Some(path) => read_config(path)?,
        None => Settings::default(),
    };

    let mut settings = base.merge(args.into_settings());
    settings.validate()?;
    tracing::debug!(?settings, "validated settings");

    let vars = if settings.templating {
        TemplateVars::from_process()
    } else {
        TemplateVars::default()
    };

    upload(&SshConnector, &settings, &vars)?;

    Ok(())
}
