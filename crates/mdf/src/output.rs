//! Terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
///
/// Command results go to stdout; messages and errors go to stderr.
pub(crate) struct Output {
    stdout: Term,
    stderr: Term,
    green: Style,
    red: Style,
    cyan_bold: Style,
    dim: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            stdout: Term::stdout(),
            stderr: Term::stderr(),
            green: Style::new().green(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
            dim: Style::new().dim(),
        }
    }

    /// Write command output to stdout.
    pub(crate) fn data(&self, text: &str) {
        let _ = self.stdout.write_line(text);
    }

    /// Write a highlighted heading to stdout (cyan bold).
    pub(crate) fn highlight(&self, msg: &str) {
        let _ = self
            .stdout
            .write_line(&self.cyan_bold.apply_to(msg).to_string());
    }

    /// Write secondary detail to stdout (dim).
    pub(crate) fn detail(&self, msg: &str) {
        let _ = self.stdout.write_line(&self.dim.apply_to(msg).to_string());
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.stderr.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.stderr.write_line(&self.red.apply_to(msg).to_string());
    }
}
