use crate::cli::{Cli, Commands};
use crate::Config;
use anyhow::Result;
use std::path::PathBuf;

mod check;
mod list;
mod render;

pub fn execute(cli: Cli) -> Result<()> {
    // Configuration is resolved once and shared by every command
    let config = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { files } => check::execute(&config, files),

        Commands::List {
            file,
            format,
            section,
        } => list::execute(&config, file, format, section),

        Commands::Render { file, check } => render::execute(&config, file, check),
    }
}

/// Use the file given on the command line, or fall back to the configured manifest.
fn manifest_or_default(config: &Config, file: Option<PathBuf>) -> Result<PathBuf> {
    match file {
        Some(path) => Ok(path),
        None => config.manifest_path(),
    }
}
