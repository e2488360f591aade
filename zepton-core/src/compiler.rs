//! Compile driver.
//!
//! Ties the pipeline together: verify the source file, normalize,
//! lex, rewrite, hand the generated unit to the backend, and report.
//! Structural errors end a file's compile with a fatal report but are
//! an ordinary `Ok(false)` outcome; only tooling failures (unreadable
//! file, backend unavailable) surface as `Err` and mark the batch as
//! internally failed.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use walkdir::WalkDir;

use crate::backend::{Backend, BackendOptions, Diagnostic};
use crate::config::Config;
use crate::error::{CoreError, StructuralError};
use crate::lexer::lex;
use crate::normalize::normalize;
use crate::reporter::Reporter;
use crate::rewriter::{rewrite, ProgramUnit};

/// File extension of ZeptoN sources.
pub const SOURCE_EXTENSION: &str = "zep";

/// Smallest plausible source: `prog A{begin{}}` is 15 bytes.
pub const MIN_SOURCE_LEN: u64 = 15;

/// Result of compiling one generated unit.
#[derive(Debug)]
pub struct CompileOutcome {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub elapsed: Option<Duration>,
}

/// Per-batch tallies; `exit_code` folds them into the process status.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub compiled: usize,
    pub failed: usize,
    pub internal_errors: usize,
}

impl BatchSummary {
    /// 0 all compiled, 1 at least one compile failed, 2 at least one
    /// internal error. Internal errors dominate.
    pub fn exit_code(&self) -> u8 {
        if self.internal_errors > 0 {
            2
        } else if self.failed > 0 {
            1
        } else {
            0
        }
    }
}

/// Transpile ZeptoN text into a generated host unit.
pub fn transpile(source: &str, expected_name: Option<&str>) -> Result<ProgramUnit, StructuralError> {
    let normalized = normalize(source)?;
    rewrite(lex(&normalized).into_iter(), expected_name)
}

/// Transpile the ZeptoN source file at `path`. The file stem is the
/// expected program name.
pub fn transpile_file(path: &Path) -> Result<ProgramUnit, CoreError> {
    verify_file(path)?;
    let source = fs::read_to_string(path)?;
    let expected = path.file_stem().and_then(|stem| stem.to_str());
    Ok(transpile(&source, expected)?)
}

/// Check that `path` exists, carries the `.zep` extension, and is at
/// least large enough to hold a minimal program.
pub fn verify_file(path: &Path) -> Result<(), CoreError> {
    let meta = fs::metadata(path).map_err(|_| CoreError::MissingSource(path.to_path_buf()))?;
    if path.extension().and_then(|ext| ext.to_str()) != Some(SOURCE_EXTENSION) {
        return Err(CoreError::NotZeptonSource(path.to_path_buf()));
    }
    if meta.len() < MIN_SOURCE_LEN {
        return Err(CoreError::SourceTooSmall(path.to_path_buf()));
    }
    Ok(())
}

/// Run the backend over one generated unit. An empty unit is a failed
/// compile that never reaches the backend.
pub fn compile_unit(
    unit: &ProgramUnit,
    config: &Config,
    backend: &mut dyn Backend,
) -> Result<CompileOutcome, CoreError> {
    if unit.is_empty() {
        return Ok(CompileOutcome {
            success: false,
            diagnostics: Vec::new(),
            elapsed: None,
        });
    }

    if config.dump_generated_source {
        let dump_path = PathBuf::from(format!("{}.java", unit.name));
        fs::write(&dump_path, &unit.source)?;
        log::debug!("dumped generated source to {}", dump_path.display());
    }

    let options = BackendOptions::from_config(config);
    let started = Instant::now();
    let outcome = backend.compile(unit, &options)?;
    let elapsed = config.time_compile.then(|| started.elapsed());

    log::debug!(
        "backend verdict for '{}': success={}, {} diagnostic(s)",
        unit.name,
        outcome.success,
        outcome.diagnostics.len()
    );

    Ok(CompileOutcome {
        success: outcome.success,
        diagnostics: outcome.diagnostics,
        elapsed,
    })
}

/// Compile one source file end to end, reporting to `sink`. Returns
/// whether the compile succeeded.
pub fn compile_file<W: Write>(
    path: &Path,
    config: &Config,
    backend: &mut dyn Backend,
    sink: &mut W,
) -> Result<bool, CoreError> {
    let file_name = path.display().to_string();
    let mut reporter = Reporter::new(sink, config.verbosity());

    verify_file(path)?;
    let source = fs::read_to_string(path)?;
    let expected = path.file_stem().and_then(|stem| stem.to_str());

    let unit = match transpile(&source, expected) {
        Ok(unit) => unit,
        Err(error) => {
            reporter.report_fatal(&file_name, &error)?;
            if config.echo_status {
                reporter.echo_status(&file_name, false)?;
            }
            return Ok(false);
        }
    };

    let outcome = compile_unit(&unit, config, backend)?;
    reporter.report(&file_name, &outcome.diagnostics, &unit.source)?;
    if let Some(elapsed) = outcome.elapsed {
        reporter.report_elapsed(&file_name, elapsed)?;
    }
    if config.echo_status {
        reporter.echo_status(&file_name, outcome.success)?;
    }
    Ok(outcome.success)
}

/// Compile each source in order. A failed compile or internal error
/// stops the batch only when the configuration asks for it.
pub fn compile_batch<W: Write>(
    paths: &[PathBuf],
    config: &Config,
    backend: &mut dyn Backend,
    sink: &mut W,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for path in paths {
        match compile_file(path, config, backend, sink) {
            Ok(true) => summary.compiled += 1,
            Ok(false) => {
                summary.failed += 1;
                if config.abort_on_first_error {
                    break;
                }
            }
            Err(error) => {
                summary.internal_errors += 1;
                let mut reporter = Reporter::new(sink, config.verbosity());
                let _ = reporter.report_internal(&error);
                if config.abort_on_first_error {
                    break;
                }
            }
        }
    }

    summary
}

/// Expand a mixed list of files and directories into the `.zep`
/// sources it denotes. Directories are walked recursively; files are
/// passed through untouched so that verification can report on them.
pub fn collect_sources(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
            {
                let entry_path = entry.path();
                if entry_path.is_file()
                    && entry_path
                        .extension()
                        .is_some_and(|ext| ext == SOURCE_EXTENSION)
                {
                    sources.push(entry_path.to_path_buf());
                }
            }
        } else {
            sources.push(path.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendOutcome;
    use crate::backend::DiagnosticKind;
    use std::fs::File;

    const HELLO: &str = "prog Hello {\nbegin {\nprintln(\"Hi\");\n}\n}\n";

    struct FakeBackend {
        calls: usize,
        success: bool,
        diagnostics: Vec<Diagnostic>,
    }

    impl FakeBackend {
        fn succeeding() -> Self {
            FakeBackend {
                calls: 0,
                success: true,
                diagnostics: Vec::new(),
            }
        }

        fn failing_with(diagnostics: Vec<Diagnostic>) -> Self {
            FakeBackend {
                calls: 0,
                success: false,
                diagnostics,
            }
        }
    }

    impl Backend for FakeBackend {
        fn compile(
            &mut self,
            _unit: &ProgramUnit,
            _options: &BackendOptions,
        ) -> Result<BackendOutcome, CoreError> {
            self.calls += 1;
            Ok(BackendOutcome {
                success: self.success,
                diagnostics: self.diagnostics.clone(),
            })
        }
    }

    struct BrokenBackend;

    impl Backend for BrokenBackend {
        fn compile(
            &mut self,
            _unit: &ProgramUnit,
            _options: &BackendOptions,
        ) -> Result<BackendOutcome, CoreError> {
            Err(CoreError::Backend("cannot invoke 'javac'".to_string()))
        }
    }

    fn quiet_config() -> Config {
        Config::default()
    }

    fn write_source(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).expect("write source");
        path
    }

    #[test]
    fn transpile_produces_named_unit() {
        let unit = transpile(HELLO, Some("Hello")).expect("transpile");
        assert_eq!(unit.name, "Hello");
        assert!(unit.source.contains("public final class Hello"));
    }

    #[test]
    fn empty_unit_never_reaches_the_backend() {
        let mut backend = FakeBackend::succeeding();
        let outcome = compile_unit(&ProgramUnit::empty(), &quiet_config(), &mut backend)
            .expect("compile unit");
        assert!(!outcome.success);
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(backend.calls, 0);
    }

    #[test]
    fn dumps_generated_source_when_asked() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let source = write_source(scratch.path(), "DumpScratch.zep", HELLO.replace("Hello", "DumpScratch").as_str());
        let unit = transpile_file(&source).expect("transpile");

        let mut config = Config::default();
        config.dump_generated_source = true;
        let mut backend = FakeBackend::succeeding();
        compile_unit(&unit, &config, &mut backend).expect("compile unit");

        let dump = PathBuf::from("DumpScratch.java");
        assert!(dump.exists());
        fs::remove_file(&dump).expect("remove dump");
    }

    #[test]
    fn times_the_backend_when_asked() {
        let unit = transpile(HELLO, Some("Hello")).expect("transpile");
        let mut config = quiet_config();
        config.time_compile = true;
        let mut backend = FakeBackend::succeeding();
        let outcome = compile_unit(&unit, &config, &mut backend).expect("compile unit");
        assert!(outcome.elapsed.is_some());
    }

    #[test]
    fn verify_rejects_missing_file() {
        let error = verify_file(Path::new("/nonexistent/Hello.zep")).unwrap_err();
        assert!(matches!(error, CoreError::MissingSource(_)));
    }

    #[test]
    fn verify_rejects_foreign_extension() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let path = write_source(scratch.path(), "Hello.java", HELLO);
        let error = verify_file(&path).unwrap_err();
        assert!(matches!(error, CoreError::NotZeptonSource(_)));
    }

    #[test]
    fn verify_rejects_implausibly_small_file() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let path = scratch.path().join("Tiny.zep");
        File::create(&path).expect("create");
        let error = verify_file(&path).unwrap_err();
        assert!(matches!(error, CoreError::SourceTooSmall(_)));
    }

    #[test]
    fn compile_file_succeeds_end_to_end() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let path = write_source(scratch.path(), "Hello.zep", HELLO);
        let mut backend = FakeBackend::succeeding();
        let mut sink = Vec::new();

        let succeeded =
            compile_file(&path, &quiet_config(), &mut backend, &mut sink).expect("compile file");
        assert!(succeeded);
        assert_eq!(backend.calls, 1);
    }

    #[test]
    fn structural_error_is_fatal_not_internal() {
        let scratch = tempfile::tempdir().expect("tempdir");
        // Program name disagrees with the file stem.
        let path = write_source(scratch.path(), "Wrong.zep", HELLO);
        let mut backend = FakeBackend::succeeding();
        let mut sink = Vec::new();

        let succeeded =
            compile_file(&path, &quiet_config(), &mut backend, &mut sink).expect("compile file");
        assert!(!succeeded);
        assert_eq!(backend.calls, 0);
        let out = String::from_utf8(sink).expect("utf8");
        assert!(out.contains("Fatal Error"));
        assert!(out.contains("does not match"));
    }

    #[test]
    fn backend_diagnostics_are_reported() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let path = write_source(scratch.path(), "Hello.zep", HELLO);
        let mut backend = FakeBackend::failing_with(vec![Diagnostic {
            kind: DiagnosticKind::Error,
            line: 3,
            column: 1,
            message: "cannot find symbol".to_string(),
        }]);
        let mut sink = Vec::new();

        let succeeded =
            compile_file(&path, &quiet_config(), &mut backend, &mut sink).expect("compile file");
        assert!(!succeeded);
        let out = String::from_utf8(sink).expect("utf8");
        assert!(out.contains("cannot find symbol"));
        assert!(out.contains("Line 3 At 1"));
    }

    #[test]
    fn batch_counts_mixed_outcomes() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let good = write_source(scratch.path(), "Hello.zep", HELLO);
        let bad = write_source(scratch.path(), "Broken.zep", "prog Broken { begin }");
        let missing = scratch.path().join("Absent.zep");

        let mut backend = FakeBackend::succeeding();
        let mut sink = Vec::new();
        let summary = compile_batch(
            &[good, bad, missing],
            &quiet_config(),
            &mut backend,
            &mut sink,
        );

        assert_eq!(
            summary,
            BatchSummary {
                compiled: 1,
                failed: 1,
                internal_errors: 1,
            }
        );
        assert_eq!(summary.exit_code(), 2);
    }

    #[test]
    fn batch_aborts_on_first_error_when_asked() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let bad = write_source(scratch.path(), "Broken.zep", "prog Broken { begin }");
        let good = write_source(scratch.path(), "Hello.zep", HELLO);

        let mut config = quiet_config();
        config.abort_on_first_error = true;
        let mut backend = FakeBackend::succeeding();
        let mut sink = Vec::new();
        let summary = compile_batch(&[bad, good], &config, &mut backend, &mut sink);

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.compiled, 0);
        assert_eq!(backend.calls, 0);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn broken_backend_is_an_internal_error() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let path = write_source(scratch.path(), "Hello.zep", HELLO);
        let mut backend = BrokenBackend;
        let mut sink = Vec::new();

        let summary = compile_batch(&[path], &quiet_config(), &mut backend, &mut sink);
        assert_eq!(summary.internal_errors, 1);
        assert_eq!(summary.exit_code(), 2);
        let out = String::from_utf8(sink).expect("utf8");
        assert!(out.contains("Internal Error"));
    }

    #[test]
    fn collects_sources_from_directories() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let nested = scratch.path().join("nested");
        fs::create_dir(&nested).expect("mkdir");
        write_source(scratch.path(), "A.zep", HELLO);
        write_source(&nested, "B.zep", HELLO);
        write_source(scratch.path(), "ignored.txt", "not a source");

        let sources = collect_sources(&[scratch.path().to_path_buf()]);
        let names: Vec<_> = sources
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .collect();
        assert_eq!(names, vec!["A.zep", "B.zep"]);
    }

    #[test]
    fn passes_plain_files_through_collection() {
        let odd = PathBuf::from("NoSuch.txt");
        assert_eq!(collect_sources(&[odd.clone()]), vec![odd]);
    }
}
