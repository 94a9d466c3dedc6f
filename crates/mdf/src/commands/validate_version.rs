//! `mdf validate-version` command implementation.

use clap::Args;
use mdf_version::VersionConstraintValidator;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the validate-version command.
#[derive(Args)]
pub(crate) struct ValidateVersionArgs {
    /// Version to check, e.g. `1.2.3` or `v1.2`.
    version: String,

    /// Semver range, e.g. `^1.0` or `>=1.0 <2.0` (default: any well-formed version).
    constraint: Option<String>,
}

impl ValidateVersionArgs {
    /// Execute the validate-version command.
    ///
    /// # Errors
    ///
    /// Returns the validation failure if the version is rejected.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let constraint = self.constraint.as_deref().unwrap_or_default();

        VersionConstraintValidator.validate(&self.version, constraint)?;

        if constraint.is_empty() {
            output.success(&format!("{} is a valid version", self.version));
        } else {
            output.success(&format!("{} satisfies {constraint}", self.version));
        }
        Ok(())
    }
}
