//! mdf CLI - Markdown rendering with allow-listed HTML.
//!
//! Provides commands for:
//! - `render`: Render a markdown file (or stdin) to sanitized HTML
//! - `parsers`: List registered parsers and their extensions
//! - `allowed-html`: Show the merged allowed HTML for a parser and theme
//! - `validate-version`: Check a version against a semver constraint

mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{AllowedHtmlArgs, ParsersArgs, RenderArgs, ValidateVersionArgs};
use output::Output;

/// mdf - Markdown rendering with allow-listed HTML.
#[derive(Parser)]
#[command(name = "mdf", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover mdf.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render markdown to HTML.
    Render(RenderArgs),
    /// List registered parsers.
    Parsers(ParsersArgs),
    /// Show the merged allowed HTML.
    AllowedHtml(AllowedHtmlArgs),
    /// Validate a version against a constraint.
    ValidateVersion(ValidateVersionArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Render(args) => args.execute(config),
        Commands::Parsers(args) => args.execute(config),
        Commands::AllowedHtml(args) => args.execute(config),
        Commands::ValidateVersion(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_with_global_flags() {
        let cli = Cli::try_parse_from([
            "mdf", "render", "README.md", "--parser", "comrak", "--no-sanitize", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Render(_)));
    }

    #[test]
    fn test_parse_validate_version() {
        let cli = Cli::try_parse_from(["mdf", "validate-version", "1.2.3", "^1.0"]).unwrap();
        assert!(matches!(cli.command, Commands::ValidateVersion(_)));
    }

    #[test]
    fn test_parse_config_after_subcommand() {
        let cli = Cli::try_parse_from(["mdf", "parsers", "--json", "--config", "site/mdf.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("site/mdf.toml")));
    }

    #[test]
    fn test_validate_version_requires_version() {
        assert!(Cli::try_parse_from(["mdf", "validate-version"]).is_err());
    }
}
