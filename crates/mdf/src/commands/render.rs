//! `mdf render` command implementation.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use mdf_config::{CliSettings, Config};
use mdf_render::RenderService;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render (default: read stdin).
    file: Option<PathBuf>,

    /// Parser id (overrides config).
    #[arg(short, long)]
    parser: Option<String>,

    /// Theme whose allowed HTML applies (overrides config).
    #[arg(short, long)]
    theme: Option<String>,

    /// Print the parser output without sanitizing it.
    #[arg(long)]
    no_sanitize: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input cannot be read, or
    /// rendering fails.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            default_parser: self.parser,
            theme: self.theme,
            sanitize: self.no_sanitize.then_some(false),
        };
        let config = Config::load(config_path, Some(&cli_settings))?;
        let service = RenderService::from_config(&config)?;

        let markdown = match &self.file {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            }
        };

        let document = service.render_document(&markdown, None, None)?;
        tracing::info!(
            parser = %document.parser_id,
            sanitized = document.sanitized,
            "Rendered document"
        );
        output.data(document.html.trim_end());
        Ok(())
    }
}
