//! `mdf allowed-html` command implementation.

use std::path::Path;

use clap::Args;
use mdf_config::{CliSettings, Config};
use mdf_render::RenderService;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the allowed-html command.
#[derive(Args)]
pub(crate) struct AllowedHtmlArgs {
    /// Parser id (default: configured or lowest-weight parser).
    #[arg(short, long)]
    parser: Option<String>,

    /// Theme whose allowed HTML is merged in (overrides config).
    #[arg(short, long)]
    theme: Option<String>,
}

impl AllowedHtmlArgs {
    /// Print the merged allow-list in allowed-HTML syntax.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the parser is unknown.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            theme: self.theme,
            ..CliSettings::default()
        };
        let config = Config::load(config_path, Some(&cli_settings))?;
        let service = RenderService::from_config(&config)?;

        let parser = service.parser(self.parser.as_deref())?;
        let spec = service.allowed_html(&parser.descriptor().id, None);
        output.data(&spec.to_string());
        Ok(())
    }
}
