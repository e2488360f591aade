//! Backend compiler interface.
//!
//! The driver talks to the host-language compiler through the
//! [`Backend`] trait so the pipeline stays testable with an in-memory
//! fake. The bundled [`JavacBackend`] stages the generated unit in a
//! scratch directory, invokes the `javac` executable synchronously,
//! and parses its stderr back into [`Diagnostic`]s whose line numbers
//! refer to the generated text (and, by the line-fidelity invariant,
//! to the original ZeptoN source).

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crate::config::{Config, Verbosity};
use crate::error::CoreError;
use crate::rewriter::ProgramUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Error,
    Warning,
    MandatoryWarning,
    Note,
    Other,
}

/// One backend diagnostic. `line` and `column` are 1-based positions
/// into the generated source; `line == 0` marks a position-less
/// message (javac notes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct BackendOutcome {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Options handed to the backend, derived from [`Config`].
#[derive(Debug, Clone)]
pub struct BackendOptions {
    pub output_dir: PathBuf,
    pub emit_debug_info: bool,
    /// Run advisory lints; disabled under hushed verbosity.
    pub lint: bool,
    pub extra_args: Vec<String>,
}

impl BackendOptions {
    pub fn from_config(config: &Config) -> Self {
        BackendOptions {
            output_dir: config.output_dir.clone(),
            emit_debug_info: config.emit_debug_info,
            lint: config.verbosity() != Verbosity::HushWarnings,
            extra_args: config.backend_args.clone(),
        }
    }
}

/// The externally supplied backend compiler.
pub trait Backend {
    /// Compile one generated unit. Returns the backend's verdict and
    /// diagnostics; an `Err` means the backend itself failed to run,
    /// which is an internal problem distinct from a failed compile.
    fn compile(
        &mut self,
        unit: &ProgramUnit,
        options: &BackendOptions,
    ) -> Result<BackendOutcome, CoreError>;
}

/// Backend that drives the host `javac` executable.
#[derive(Debug, Clone)]
pub struct JavacBackend {
    program: PathBuf,
}

impl JavacBackend {
    pub fn new() -> Self {
        JavacBackend {
            program: PathBuf::from("javac"),
        }
    }

    /// Use a specific compiler executable instead of `javac` on PATH.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        JavacBackend {
            program: program.into(),
        }
    }
}

impl Default for JavacBackend {
    fn default() -> Self {
        JavacBackend::new()
    }
}

impl Backend for JavacBackend {
    fn compile(
        &mut self,
        unit: &ProgramUnit,
        options: &BackendOptions,
    ) -> Result<BackendOutcome, CoreError> {
        let staging = tempfile::tempdir()
            .map_err(|err| CoreError::Backend(format!("cannot create staging directory: {err}")))?;

        let mut source_dir = staging.path().to_path_buf();
        if let Some(package) = &unit.package {
            for part in package.split('.') {
                source_dir.push(part);
            }
            fs::create_dir_all(&source_dir)
                .map_err(|err| CoreError::Backend(format!("cannot stage package path: {err}")))?;
        }
        let source_path = source_dir.join(format!("{}.java", unit.name));
        fs::write(&source_path, &unit.source)
            .map_err(|err| CoreError::Backend(format!("cannot stage generated source: {err}")))?;

        fs::create_dir_all(&options.output_dir)
            .map_err(|err| CoreError::Backend(format!("cannot create output directory: {err}")))?;

        let mut command = Command::new(&self.program);
        command
            .arg("-d")
            .arg(&options.output_dir)
            .arg(if options.emit_debug_info { "-g" } else { "-g:none" })
            .arg(if options.lint { "-Xlint:all" } else { "-Xlint:none" })
            .args(&options.extra_args)
            .arg(&source_path);

        log::debug!("invoking backend: {command:?}");

        let output = command.output().map_err(|err| {
            CoreError::Backend(format!(
                "cannot invoke '{}': {err}",
                self.program.display()
            ))
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(BackendOutcome {
            success: output.status.success(),
            diagnostics: parse_backend_diagnostics(&stderr),
        })
    }
}

/// Parse javac's stderr. Positioned diagnostics arrive as a
/// `<path>:<line>: <kind>: <message>` header followed by the echoed
/// source line and a caret line giving the column; `Note:` lines carry
/// no position; trailing `N errors`/`N warnings` summaries are skipped.
fn parse_backend_diagnostics(stderr: &str) -> Vec<Diagnostic> {
    let lines: Vec<&str> = stderr.lines().collect();
    let mut diagnostics = Vec::new();

    let mut idx = 0;
    while idx < lines.len() {
        let line = lines[idx];

        if let Some((kind, line_no, message)) = split_header(line) {
            let mut column = 1;
            let mut consumed = 1;
            if let Some(caret_line) = lines.get(idx + 2) {
                if let Some(pos) = caret_position(caret_line) {
                    column = pos;
                    consumed = 3;
                }
            }
            diagnostics.push(Diagnostic {
                kind,
                line: line_no,
                column,
                message,
            });
            idx += consumed;
            continue;
        }

        if let Some(message) = line.strip_prefix("Note: ") {
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::Note,
                line: 0,
                column: 0,
                message: message.to_string(),
            });
        }

        idx += 1;
    }

    diagnostics
}

fn split_header(line: &str) -> Option<(DiagnosticKind, u32, String)> {
    const MARKERS: &[(&str, DiagnosticKind)] = &[
        (": error: ", DiagnosticKind::Error),
        (": warning: ", DiagnosticKind::Warning),
    ];
    for (marker, kind) in MARKERS {
        if let Some(pos) = line.find(marker) {
            let head = &line[..pos];
            let line_no: u32 = head.rsplit(':').next()?.trim().parse().ok()?;
            let message = line[pos + marker.len()..].to_string();
            return Some((*kind, line_no, message));
        }
    }
    None
}

/// Column indicated by a javac caret line: spaces then a single `^`.
fn caret_position(line: &str) -> Option<u32> {
    let pos = line.find('^')?;
    let head_is_blank = line[..pos].chars().all(|ch| ch == ' ');
    let tail_is_blank = line[pos + 1..].trim().is_empty();
    (head_is_blank && tail_is_blank).then_some(pos as u32 + 1)
}
