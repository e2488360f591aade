use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use zepton_core::{Config, JavacBackend, Verbosity, collect_sources, compile_batch};

/// ZeptoN transcompiler: rewrites .zep sources into Java and drives
/// the host javac compiler over the result.
#[derive(Parser, Debug)]
#[command(name = "zepc", version, about, long_about = None)]
struct Cli {
    /// ZeptoN source files or directories to compile
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        default_value = ".",
        help = "Output directory for compiled artifacts"
    )]
    dir: PathBuf,

    #[arg(long, help = "Write the generated Java source to <Name>.java")]
    dump: bool,

    #[arg(long, help = "Echo per-file compile success or failure")]
    echo: bool,

    #[arg(long = "final", help = "Compile without debug information")]
    release: bool,

    #[arg(long, help = "Report elapsed backend time per file")]
    time: bool,

    #[arg(long, help = "Stop the batch at the first file that fails")]
    panic: bool,

    #[arg(
        long,
        group = "verbosity",
        help = "Print per-kind diagnostic totals instead of details"
    )]
    brief: bool,
    #[arg(long, group = "verbosity", help = "Report errors only")]
    hush: bool,
    #[arg(long, group = "verbosity", help = "Suppress all diagnostic output")]
    mute: bool,

    #[arg(
        long = "backend-arg",
        value_name = "ARG",
        help = "Extra argument passed to the backend compiler as-is"
    )]
    backend_args: Vec<String>,

    #[arg(long, help = "Enable debug logging")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Internal Error: {error:#}.");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    simple_logger::SimpleLogger::new().with_level(level).init()?;

    let mut config = Config::default();
    config.emit_debug_info = !cli.release;
    config.dump_generated_source = cli.dump;
    config.echo_status = cli.echo;
    config.time_compile = cli.time;
    config.abort_on_first_error = cli.panic;
    config.output_dir = cli.dir;
    config.backend_args = cli.backend_args;
    // The clap group already rejects combined flags; set_verbosity
    // guards programmatic use the same way.
    if cli.brief {
        config.set_verbosity(Verbosity::BriefCounts)?;
    }
    if cli.hush {
        config.set_verbosity(Verbosity::HushWarnings)?;
    }
    if cli.mute {
        config.set_verbosity(Verbosity::MuteAll)?;
    }

    let sources = collect_sources(&cli.files);
    if sources.is_empty() {
        anyhow::bail!("no ZeptoN sources found in the given paths");
    }

    let mut backend = JavacBackend::new();
    let mut stdout = io::stdout().lock();
    let summary = compile_batch(&sources, &config, &mut backend, &mut stdout);
    log::debug!("batch summary: {summary:?}");
    Ok(ExitCode::from(summary.exit_code()))
}

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    fn zepc() -> Command {
        Command::cargo_bin("zepc").expect("binary exists")
    }

    #[test]
    fn reports_program_name_mismatch() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("Wrong.zep");
        fs::write(&input_path, "prog Hello {\nbegin {\nprintln(1);\n}\n}\n").expect("write input");

        zepc()
            .arg(&input_path)
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Fatal Error"))
            .stdout(predicate::str::contains("does not match"));
    }

    #[test]
    fn reports_missing_begin_block() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("NoBody.zep");
        fs::write(&input_path, "prog NoBody {\nint x = 1;\n}\n").expect("write input");

        zepc()
            .arg(&input_path)
            .assert()
            .code(1)
            .stdout(predicate::str::contains("missing 'begin'"));
    }

    #[test]
    fn rejects_conflicting_verbosity_flags() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("Hello.zep");
        fs::write(&input_path, "prog Hello {\nbegin {\n}\n}\n").expect("write input");

        zepc()
            .arg(&input_path)
            .arg("--brief")
            .arg("--mute")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("cannot be used with"));
    }

    #[test]
    fn rejects_foreign_extension_as_internal_error() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("Hello.java");
        fs::write(&input_path, "class Hello {}").expect("write input");

        zepc()
            .arg(&input_path)
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Internal Error"));
    }

    #[test]
    fn requires_at_least_one_source() {
        zepc().assert().code(2);
    }

    #[test]
    fn mute_silences_fatal_reports_but_keeps_the_exit_code() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("Wrong.zep");
        fs::write(&input_path, "prog Hello {\nbegin {\n}\n}\n").expect("write input");

        zepc()
            .arg(&input_path)
            .arg("--mute")
            .assert()
            .code(1)
            .stdout(predicate::str::is_empty());
    }
}
