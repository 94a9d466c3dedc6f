//! `mdf parsers` command implementation.

use std::path::Path;

use clap::Args;
use mdf_config::Config;
use mdf_parser::{Extension, ParserDescriptor};
use mdf_render::RenderService;
use serde::Serialize;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the parsers command.
#[derive(Args)]
pub(crate) struct ParsersArgs {
    /// Print machine-readable JSON.
    #[arg(long)]
    json: bool,
}

/// A registered parser with its extensions.
#[derive(Serialize)]
struct ParserEntry<'a> {
    #[serde(flatten)]
    descriptor: &'a ParserDescriptor,
    extensions: &'a [Extension],
}

impl ParsersArgs {
    /// Execute the parsers command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(config_path, None)?;
        let service = RenderService::from_config(&config)?;

        let entries: Vec<ParserEntry<'_>> = service
            .registry()
            .parsers()
            .into_iter()
            .map(|parser| ParserEntry {
                descriptor: parser.descriptor(),
                extensions: parser.extensions(),
            })
            .collect();

        if self.json {
            output.data(&serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        for entry in &entries {
            let descriptor = entry.descriptor;
            output.highlight(&format!("{} ({})", descriptor.id, descriptor.label));
            output.detail(&format!(
                "  {} {} | weight {} | {}",
                descriptor.library, descriptor.library_version, descriptor.weight, descriptor.capabilities
            ));
            for extension in entry.extensions {
                let marker = if extension.enabled { "+" } else { "-" };
                output.data(&format!(
                    "  {marker} {}: {}",
                    extension.descriptor.id, extension.descriptor.description
                ));
            }
        }
        Ok(())
    }
}
