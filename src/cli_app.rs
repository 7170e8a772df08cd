//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::Parser;
use colored::{Colorize, control};
use thiserror::Error;

use cachesim_grader::core::config::Config;
use cachesim_grader::core::errors::GraderError;
use cachesim_grader::grading::compare::Outcome;
use cachesim_grader::grading::invoke::SubjectInvoker;
use cachesim_grader::grading::orchestrator::{FixturePair, Orchestrator, RunObserver};
use cachesim_grader::grading::report::{
    RunReport, SUBSET_NOTICE, rubric_lines, total_line, write_artifact,
};
use cachesim_grader::grading::rubric::{RuleNumber, TestResult};
use cachesim_grader::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};

/// Cache simulator grader: runs ./cachesim against every fixture and scores the rubric.
#[derive(Debug, Parser)]
#[command(
    name = "cachegrade",
    author,
    version,
    about = "Cache Simulator Grader - fixture-driven autograding",
    long_about = None
)]
pub struct Cli {
    /// Override config file path (default: ./cachegrade.toml when present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Directory holding inputs/, expected/, test_results/ and the simulator.
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Simulator executable to grade. Relative paths, bare names included,
    /// resolve against --root; there is no PATH lookup.
    #[arg(long, value_name = "PATH")]
    simulator: Option<PathBuf>,
    /// Replacement policy passed as the first simulator argument.
    #[arg(long, value_name = "NAME")]
    policy: Option<String>,
    /// Per-test time limit in seconds (0 disables).
    #[arg(long, value_name = "SECONDS")]
    timeout_secs: Option<u64>,
    /// Print a JSON report instead of human-readable output.
    #[arg(long)]
    json: bool,
    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
    /// Show subject stderr for crashed tests.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
    /// Only print the summary.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Grading could not run.
    #[error("{0}")]
    Runtime(String),
    /// Internal failure (serialization of results).
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI. A run that completed exits 0
    /// whatever the score.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<GraderError> for CliError {
    fn from(err: GraderError) -> Self {
        match err {
            GraderError::InvalidConfig { .. }
            | GraderError::MissingConfig { .. }
            | GraderError::ConfigParse { .. } => Self::User(err.to_string()),
            GraderError::Serialization { .. } => Self::Internal(err.to_string()),
            other => Self::Runtime(other.to_string()),
        }
    }
}

/// Grade the configured fixture layout.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color || cli.json {
        control::set_override(false);
    }

    let config = effective_config(cli)?;
    let mut log = match config.jsonl_log() {
        Some(path) => JsonlWriter::open(path),
        None => JsonlWriter::disabled(),
    };

    let mut start = LogEntry::new(EventType::RunStart, Severity::Info);
    start.details = Some(format!(
        "executable={} policy={} timeout_secs={}",
        config.executable().display(),
        config.subject.replacement_policy,
        config.subject.timeout_secs
    ));
    log.write_entry(&start);

    let started = Instant::now();
    let result = grade(cli, &config, &mut log);
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok((report, artifact)) => {
            let total = report.total();
            let mut done = LogEntry::new(EventType::RunComplete, Severity::Info);
            done.score = Some(total.score);
            done.max_score = Some(total.max_score);
            done.duration_ms = Some(duration_ms);
            done.artifact = Some(artifact.display().to_string());
            log.write_entry(&done);
            log.flush();
            if output_mode(cli) == OutputMode::Json {
                print_json_report(&report, &artifact)?;
            }
            Ok(())
        }
        Err(err) => {
            let mut failed = LogEntry::new(EventType::Error, Severity::Critical);
            failed.error_code = Some(err.code().to_string());
            failed.details = Some(err.to_string());
            failed.duration_ms = Some(duration_ms);
            log.write_entry(&failed);
            log.flush();
            Err(err.into())
        }
    }
}

fn output_mode(cli: &Cli) -> OutputMode {
    if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    }
}

/// Config file + env, then command-line flags on top.
fn effective_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(root) = &cli.root {
        config.paths.root.clone_from(root);
    }
    if let Some(simulator) = &cli.simulator {
        config.subject.executable.clone_from(simulator);
    }
    if let Some(policy) = &cli.policy {
        config.subject.replacement_policy.clone_from(policy);
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.subject.timeout_secs = timeout_secs;
    }
    config.validate()?;
    Ok(config)
}

fn grade(
    cli: &Cli,
    config: &Config,
    log: &mut JsonlWriter,
) -> Result<(RunReport, PathBuf), GraderError> {
    let mode = output_mode(cli);
    let human = mode == OutputMode::Human;

    if human {
        println!(
            "{}",
            "Checking ADJACENT and SEQUENTIAL functionality.".bold()
        );
    }

    let subject = SubjectInvoker::new(config.executable(), config.subject_timeout());
    let orchestrator = Orchestrator::new(
        &subject,
        config.inputs_dir(),
        config.expected_dir(),
        config.subject.replacement_policy.as_str(),
    );
    let mut console = ConsoleObserver {
        progress: human && !cli.quiet,
        verbose: cli.verbose,
        log,
    };
    let results = orchestrator.run(&mut console)?;
    if results.is_empty() {
        eprintln!(
            "[CSG-WARN] no fixture pairs found under {} and {}",
            config.inputs_dir().display(),
            config.expected_dir().display()
        );
    }

    let report = RunReport::from_results(results);
    let results_dir = config.results_dir();

    if human {
        print_summary(&report);
    }
    let artifact = write_artifact(&results_dir, &report.results, Local::now().naive_local())?;
    if human {
        println!(
            "{}",
            format!("Writing results to {}", artifact.display()).bold()
        );
    }
    Ok((report, artifact))
}

fn print_summary(report: &RunReport) {
    println!("\n{}", "Results Summary".bold());
    for line in rubric_lines(&report.summary) {
        println!("  {line}");
    }
    println!();
    println!("  {}", total_line(&report.summary).bold());
    println!();
    for line in SUBSET_NOTICE {
        println!("  {}", line.yellow());
    }
    println!();
}

fn print_json_report(report: &RunReport, artifact: &Path) -> Result<(), CliError> {
    let doc = serde_json::to_string_pretty(&report.document(Some(artifact)))?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{doc}")?;
    Ok(())
}

/// Prints per-test progress and mirrors results into the activity log.
struct ConsoleObserver<'a> {
    progress: bool,
    verbose: bool,
    log: &'a mut JsonlWriter,
}

impl RunObserver for ConsoleObserver<'_> {
    fn on_input(&mut self, input: &Path) {
        if self.progress {
            println!("  Checking {}", input.display());
        }
    }

    fn on_test_start(&mut self, _number: &RuleNumber, pair: &FixturePair) {
        if self.progress {
            print!("    with parameters {}... ", pair.params.describe());
            let _ = io::stdout().flush();
        }
    }

    fn on_result(&mut self, result: &TestResult, outcome: &Outcome) {
        if self.progress {
            if outcome.is_pass() {
                println!("{}", "PASS".bold().green());
            } else {
                println!("{}", "FAIL".bold().red());
                println!("{}", result.output);
                if self.verbose
                    && let Outcome::SubjectCrashed { stderr, .. } = outcome
                {
                    for line in stderr.lines() {
                        println!("        {}", line.dimmed());
                    }
                }
            }
        }

        let mut entry = LogEntry::new(
            EventType::TestComplete,
            if outcome.is_pass() {
                Severity::Info
            } else {
                Severity::Warning
            },
        );
        entry.number = Some(result.number.to_string());
        entry.name = Some(result.name.clone());
        entry.outcome = Some(outcome.kind().to_string());
        entry.score = Some(result.score);
        entry.max_score = Some(result.max_score);
        self.log.write_entry(&entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_one() {
        let err = CliError::from(GraderError::InvalidConfig {
            details: "bad policy".to_string(),
        });
        assert_eq!(err.exit_code(), 1);
        let err = CliError::from(GraderError::MissingConfig {
            path: PathBuf::from("cachegrade.toml"),
        });
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn harness_errors_exit_two() {
        let err = CliError::from(GraderError::MissingDirectory {
            path: PathBuf::from("inputs"),
        });
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("CSG-2001"));
        let err = CliError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn serialization_errors_exit_three() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CliError::from(GraderError::from(json_err));
        assert!(matches!(err, CliError::Internal(_)));
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("CSG-2101"));

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(CliError::from(json_err).exit_code(), 3);
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from([
            "cachegrade",
            "--root",
            "/srv/grading",
            "--policy",
            "fifo",
            "--timeout-secs",
            "5",
            "--json",
        ]);
        assert_eq!(cli.root, Some(PathBuf::from("/srv/grading")));
        assert_eq!(cli.policy.as_deref(), Some("fifo"));
        assert_eq!(cli.timeout_secs, Some(5));
        assert_eq!(output_mode(&cli), OutputMode::Json);
    }
}
