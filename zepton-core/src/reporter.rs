//! Diagnostic reporting.
//!
//! Renders backend diagnostics, structural errors, and internal
//! failures to any `io::Write` sink, honoring the configured
//! verbosity. Because the rewriter preserves source line numbers,
//! the rendered generated line doubles as the offending ZeptoN line
//! for all user-authored code.

use std::io::{self, Write};
use std::time::Duration;

use crate::backend::{Diagnostic, DiagnosticKind};
use crate::config::Verbosity;
use crate::error::{CoreError, StructuralError};

pub struct Reporter<'w, W: Write> {
    sink: &'w mut W,
    verbosity: Verbosity,
}

impl<'w, W: Write> Reporter<'w, W> {
    pub fn new(sink: &'w mut W, verbosity: Verbosity) -> Self {
        Reporter { sink, verbosity }
    }

    /// Report the diagnostics for one file against its generated text.
    pub fn report(
        &mut self,
        file_name: &str,
        diagnostics: &[Diagnostic],
        generated: &str,
    ) -> io::Result<()> {
        match self.verbosity {
            Verbosity::MuteAll => Ok(()),
            Verbosity::BriefCounts => self.report_counts(diagnostics),
            Verbosity::Full | Verbosity::HushWarnings => {
                self.report_detailed(file_name, diagnostics, generated)
            }
        }
    }

    fn report_detailed(
        &mut self,
        file_name: &str,
        diagnostics: &[Diagnostic],
        generated: &str,
    ) -> io::Result<()> {
        let lines: Vec<&str> = generated.lines().collect();

        for diag in diagnostics {
            if self.verbosity == Verbosity::HushWarnings && diag.kind != DiagnosticKind::Error {
                continue;
            }

            match diag.kind {
                DiagnosticKind::Error => writeln!(self.sink, "Error:   {file_name}.")?,
                DiagnosticKind::MandatoryWarning => writeln!(self.sink, "Caution: {file_name}.")?,
                DiagnosticKind::Warning => writeln!(self.sink, "Warning: {file_name}.")?,
                DiagnosticKind::Other => writeln!(self.sink, "Other:   {file_name}.")?,
                DiagnosticKind::Note => {}
            }

            if diag.kind == DiagnosticKind::Note {
                writeln!(self.sink, "{}", diag.message)?;
            } else {
                writeln!(
                    self.sink,
                    "Line {} At {}: {}",
                    diag.line, diag.column, diag.message
                )?;
                if diag.line >= 1 {
                    if let Some(code) = lines.get(diag.line as usize - 1) {
                        writeln!(self.sink, "{code}")?;
                        let padding = " ".repeat(diag.column.saturating_sub(1) as usize);
                        writeln!(self.sink, "{padding}^")?;
                    }
                }
            }

            writeln!(self.sink)?;
        }

        Ok(())
    }

    fn report_counts(&mut self, diagnostics: &[Diagnostic]) -> io::Result<()> {
        if diagnostics.is_empty() {
            return writeln!(self.sink, "No compiler diagnostic messages.");
        }

        writeln!(self.sink, "{:3} Diagnostic messages:", diagnostics.len())?;

        const LABELS: &[(DiagnosticKind, &str)] = &[
            (DiagnosticKind::Error, "Error!!!"),
            (DiagnosticKind::MandatoryWarning, "Caution"),
            (DiagnosticKind::Note, "Note"),
            (DiagnosticKind::Other, "Other"),
            (DiagnosticKind::Warning, "Warning"),
        ];
        for (kind, label) in LABELS {
            let count = diagnostics.iter().filter(|diag| diag.kind == *kind).count();
            if count > 0 {
                writeln!(self.sink, "  {count:3} {label}")?;
            }
        }
        writeln!(self.sink)
    }

    /// A structural (transpile-time) fatal error, tagged distinctly
    /// from backend diagnostics.
    pub fn report_fatal(&mut self, file_name: &str, error: &StructuralError) -> io::Result<()> {
        if self.verbosity == Verbosity::MuteAll {
            return Ok(());
        }
        writeln!(self.sink, "Fatal Error: {file_name}: {error}.")
    }

    /// An internal tooling failure (backend unavailable, staging
    /// failure). Never muted: the batch outcome depends on it.
    pub fn report_internal(&mut self, error: &CoreError) -> io::Result<()> {
        writeln!(self.sink, "Internal Error: {error}.")
    }

    pub fn report_elapsed(&mut self, file_name: &str, elapsed: Duration) -> io::Result<()> {
        writeln!(
            self.sink,
            "Time: {}-ms for: {file_name}",
            elapsed.as_millis()
        )
    }

    pub fn echo_status(&mut self, file_name: &str, success: bool) -> io::Result<()> {
        let verdict = if success { "Success." } else { "Failure!" };
        writeln!(
            self.sink,
            "ZeptoN compile result for '{file_name}': {verdict}"
        )
    }
}
