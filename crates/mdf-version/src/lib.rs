//! Semantic version constraint validation.
//!
//! Validates version strings against semver range expressions such as
//! `^1.0`, `>=1.2 <2.0` or `~1.4 || ^2.0`. Parsing and matching are done by
//! the `semver` crate; this crate adds normalization of loosely written
//! versions and constraints, and turns the outcome into a
//! [`ValidationFailure`] suitable for user-facing messages.
//!
//! # Example
//!
//! ```
//! use mdf_version::{ValidationFailure, validate};
//!
//! assert!(validate("1.2.3", "^1.0").is_ok());
//! assert!(validate("1.2", "").is_ok());
//! assert_eq!(validate("", "^1.0"), Err(ValidationFailure::Empty));
//! ```

use std::fmt;
use std::str::FromStr;

use semver::{Version, VersionReq};

/// Reason a version failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    /// The version string was empty.
    #[error("empty version")]
    Empty,
    /// The version is well-formed but outside the constraint.
    #[error("version {version} does not satisfy constraint {constraint}")]
    Unsatisfied {
        /// Version as given.
        version: String,
        /// Constraint as given.
        constraint: String,
    },
    /// The version or constraint could not be parsed.
    ///
    /// Displays the `semver` error message verbatim.
    #[error("{message}")]
    Parse {
        /// The string that failed to parse.
        input: String,
        /// Message from the semver parser.
        message: String,
    },
}

impl ValidationFailure {
    fn parse(input: &str, error: &semver::Error) -> Self {
        Self::Parse {
            input: input.to_owned(),
            message: error.to_string(),
        }
    }
}

/// Validate `version` against `constraint`.
///
/// - An empty version is invalid.
/// - With a non-empty constraint, the version must satisfy it.
/// - With an empty constraint, the version only has to be well-formed.
pub fn validate(version: &str, constraint: &str) -> Result<(), ValidationFailure> {
    VersionConstraintValidator.validate(version, constraint)
}

/// Stateless validator, for callers that take the validator as a dependency.
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionConstraintValidator;

impl VersionConstraintValidator {
    /// Validate `version` against `constraint`. See [`validate`].
    pub fn validate(self, version: &str, constraint: &str) -> Result<(), ValidationFailure> {
        if version.trim().is_empty() {
            return Err(ValidationFailure::Empty);
        }

        let parsed = normalize_version(version)?;
        if constraint.trim().is_empty() {
            return Ok(());
        }

        let constraint_parsed: VersionConstraint = constraint.parse()?;
        if constraint_parsed.matches(&parsed) {
            Ok(())
        } else {
            Err(ValidationFailure::Unsatisfied {
                version: version.to_owned(),
                constraint: constraint.to_owned(),
            })
        }
    }
}

/// Parse a loosely written version into a [`Version`].
///
/// Accepts an optional `v` prefix and pads a missing minor or patch
/// component with zero, so `v1.2` normalizes to `1.2.0`.
pub fn normalize_version(version: &str) -> Result<Version, ValidationFailure> {
    let trimmed = version.trim();
    let stripped = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

    let core_end = stripped.find(['-', '+']).unwrap_or(stripped.len());
    let (core, suffix) = stripped.split_at(core_end);
    let padded = match core.split('.').count() {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => stripped.to_owned(),
    };

    Version::parse(&padded).map_err(|e| ValidationFailure::parse(version, &e))
}

/// A parsed version constraint: one or more `||`-separated alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    expression: String,
    alternatives: Vec<VersionReq>,
}

impl VersionConstraint {
    /// Check whether any alternative matches `version`.
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// The constraint as originally written.
    pub fn as_str(&self) -> &str {
        &self.expression
    }
}

impl FromStr for VersionConstraint {
    type Err = ValidationFailure;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let alternatives = expression
            .split("||")
            .map(|alternative| {
                let normalized = normalize_comparators(alternative);
                VersionReq::parse(&normalized).map_err(|e| ValidationFailure::parse(expression, &e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            expression: expression.to_owned(),
            alternatives,
        })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Turn whitespace-separated comparators into the comma-separated form.
///
/// `>= 1.0 <2.0` becomes `>=1.0, <2.0`. Input that already uses commas is
/// only trimmed.
fn normalize_comparators(alternative: &str) -> String {
    let alternative = alternative.trim();
    if alternative.contains(',') {
        return alternative.to_owned();
    }

    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op = String::new();
    for token in alternative.split_whitespace() {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~')) {
            pending_op.push_str(token);
        } else {
            comparators.push(format!("{}{token}", std::mem::take(&mut pending_op)));
        }
    }
    if !pending_op.is_empty() {
        comparators.push(pending_op);
    }
    comparators.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_version() {
        assert_eq!(validate("", "^1.0"), Err(ValidationFailure::Empty));
        assert_eq!(validate("  ", ""), Err(ValidationFailure::Empty));
        assert_eq!(ValidationFailure::Empty.to_string(), "empty version");
    }

    #[test]
    fn test_satisfied_constraint() {
        assert_eq!(validate("1.2.3", "^1.0"), Ok(()));
    }

    #[test]
    fn test_unsatisfied_constraint() {
        let err = validate("2.0.0", "^1.0").unwrap_err();
        assert_eq!(
            err,
            ValidationFailure::Unsatisfied {
                version: "2.0.0".to_owned(),
                constraint: "^1.0".to_owned(),
            }
        );
        assert_eq!(
            err.to_string(),
            "version 2.0.0 does not satisfy constraint ^1.0"
        );
    }

    #[test]
    fn test_no_constraint_well_formed() {
        assert_eq!(validate("1.2.3", ""), Ok(()));
        assert_eq!(validate("1.2.3-beta.1+build.5", ""), Ok(()));
    }

    #[test]
    fn test_no_constraint_malformed() {
        let err = validate("not-a-version", "").unwrap_err();
        assert!(matches!(err, ValidationFailure::Parse { ref input, .. } if input == "not-a-version"));
    }

    #[test]
    fn test_parse_message_is_verbatim() {
        let library_message = Version::parse("x.0.0").unwrap_err().to_string();
        let err = validate("x", "").unwrap_err();
        assert_eq!(err.to_string(), library_message);
    }

    #[test]
    fn test_invalid_constraint_reports_parse_error() {
        let err = validate("1.0.0", "^^1").unwrap_err();
        assert!(matches!(err, ValidationFailure::Parse { ref input, .. } if input == "^^1"));
    }

    #[test]
    fn test_normalize_version_padding() {
        assert_eq!(normalize_version("1").unwrap(), Version::new(1, 0, 0));
        assert_eq!(normalize_version("1.2").unwrap(), Version::new(1, 2, 0));
        assert_eq!(normalize_version("v1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(
            normalize_version("1.2-rc.1").unwrap(),
            Version::parse("1.2.0-rc.1").unwrap()
        );
    }

    #[test]
    fn test_constraint_alternatives() {
        assert_eq!(validate("2.1.0", "^1.0 || ^2.0"), Ok(()));
        assert_eq!(validate("1.4.0", "^1.0 || ^2.0"), Ok(()));
        assert!(validate("3.0.0", "^1.0 || ^2.0").is_err());
    }

    #[test]
    fn test_space_separated_comparators() {
        assert_eq!(validate("1.5.0", ">=1.0 <2.0"), Ok(()));
        assert_eq!(validate("1.5.0", ">= 1.0 < 2.0"), Ok(()));
        assert!(validate("2.0.0", ">=1.0 <2.0").is_err());
    }

    #[test]
    fn test_normalize_comparators() {
        assert_eq!(normalize_comparators(" >= 1.0 <2.0 "), ">=1.0, <2.0");
        assert_eq!(normalize_comparators(">=1.0, <2.0"), ">=1.0, <2.0");
        assert_eq!(normalize_comparators("^1.2"), "^1.2");
    }

    #[test]
    fn test_constraint_display_keeps_expression() {
        let constraint: VersionConstraint = "~1.4 || ^2".parse().unwrap();
        assert_eq!(constraint.to_string(), "~1.4 || ^2");
        assert!(constraint.matches(&Version::new(1, 4, 9)));
        assert!(!constraint.matches(&Version::new(1, 5, 0)));
    }

    #[test]
    fn test_validator_value_matches_free_function() {
        let validator = VersionConstraintValidator;
        assert_eq!(validator.validate("0.13.1", "^0.13"), validate("0.13.1", "^0.13"));
    }
}
