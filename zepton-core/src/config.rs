//! Per-invocation compiler configuration.
//!
//! The original tooling kept these as process-wide flags; here a
//! `Config` value travels with each pipeline call so concurrent
//! batches cannot race on shared state.

use std::path::PathBuf;

use crate::error::CoreError;

/// Diagnostic verbosity. The three non-default levels are mutually
/// exclusive; switching between them is a configuration error rather
/// than a silent override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Report every diagnostic in full.
    #[default]
    Full,
    /// Report errors only, suppressing advisory lint categories.
    HushWarnings,
    /// Suppress all diagnostic output; only the final status remains.
    MuteAll,
    /// Suppress per-diagnostic detail, print per-kind totals instead.
    BriefCounts,
}

impl Verbosity {
    fn flag_name(self) -> &'static str {
        match self {
            Verbosity::Full => "full",
            Verbosity::HushWarnings => "hush",
            Verbosity::MuteAll => "mute",
            Verbosity::BriefCounts => "brief",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Emit debug symbol tables in the compiled artifact (`-g` vs `-g:none`).
    pub emit_debug_info: bool,
    /// Write the generated host source to `<Name>.java` in the current directory.
    pub dump_generated_source: bool,
    /// Echo compiler options and per-file success or failure.
    pub echo_status: bool,
    /// Report elapsed wall time of the backend call per file.
    pub time_compile: bool,
    /// Stop a batch at the first file that fails.
    pub abort_on_first_error: bool,
    /// Output directory for compiled artifacts.
    pub output_dir: PathBuf,
    /// Extra arguments handed to the backend compiler as-is.
    pub backend_args: Vec<String>,
    verbosity: Verbosity,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            emit_debug_info: true,
            dump_generated_source: false,
            echo_status: false,
            time_compile: false,
            abort_on_first_error: false,
            output_dir: PathBuf::from("."),
            backend_args: Vec::new(),
            verbosity: Verbosity::Full,
        }
    }
}

impl Config {
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Select a verbosity level. Selecting a second non-default level
    /// while another is active is rejected.
    pub fn set_verbosity(&mut self, verbosity: Verbosity) -> Result<(), CoreError> {
        if self.verbosity != Verbosity::Full
            && verbosity != Verbosity::Full
            && verbosity != self.verbosity
        {
            return Err(CoreError::Config(format!(
                "option -{} ambiguous with -{} option",
                verbosity.flag_name(),
                self.verbosity.flag_name(),
            )));
        }
        self.verbosity = verbosity;
        Ok(())
    }
}
