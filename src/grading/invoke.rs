//! Subject invocation: run the simulator under test once per fixture.
//!
//! The fixture bytes go to the child's stdin on a writer thread while stdout
//! and stderr drain on reader threads, so neither side can stall the other on
//! a full pipe. Readers report back over bounded channels, which lets the
//! caller enforce a deadline and kill an overdue child instead of hanging the
//! whole run.

#![allow(missing_docs)]

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use thiserror::Error;

/// Prefix that marks a simulator result line; everything else is diagnostics.
pub const OUTPUT_MARKER: &str = "OUTPUT";

const WAIT_POLL: Duration = Duration::from_millis(10);
/// How long to wait for stderr after the child has exited.
const STDERR_GRACE: Duration = Duration::from_millis(250);
const STDERR_TAIL_LINES: usize = 20;

/// Why an invocation produced no usable output.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("cannot read input fixture {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot launch {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("subject pipe failure: {source}")]
    Pipe {
        #[source]
        source: io::Error,
    },

    #[error("subject crashed ({status})")]
    Crashed { status: String, stderr: String },

    #[error("subject timed out after {after:?}")]
    TimedOut { after: Duration },
}

impl ProcessError {
    /// True when the harness itself is broken (unreadable fixture, missing
    /// executable, pipe failure). Such errors abort the run instead of being
    /// scored against the subject.
    #[must_use]
    pub const fn is_harness_fault(&self) -> bool {
        matches!(
            self,
            Self::Input { .. } | Self::Spawn { .. } | Self::Pipe { .. }
        )
    }
}

/// The program being graded.
pub trait Subject {
    /// Run once with `args`, feeding the bytes of `input` on stdin, and
    /// return the `OUTPUT` lines it printed, in order.
    fn run_simulation(&self, args: &[String], input: &Path)
    -> Result<Vec<String>, ProcessError>;
}

/// Launches the simulator executable as a child process.
#[derive(Debug, Clone)]
pub struct SubjectInvoker {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl SubjectInvoker {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run the child to completion and return its raw stdout.
    fn capture(&self, args: &[String], input: Vec<u8>) -> Result<Vec<u8>, ProcessError> {
        let started = Instant::now();
        let deadline = self.timeout.map(|limit| started + limit);

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A subject that exits without reading closes the pipe; that is
            // its business, not a harness failure.
            thread::spawn(move || {
                let _ = stdin.write_all(&input);
            });
        }
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let stdout = match recv_by(&stdout_rx, deadline) {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(source)) => {
                kill_and_reap(&mut child);
                return Err(ProcessError::Pipe { source });
            }
            Err(RecvTimeoutError::Timeout) => {
                kill_and_reap(&mut child);
                return Err(self.timed_out(started));
            }
            Err(RecvTimeoutError::Disconnected) => {
                kill_and_reap(&mut child);
                return Err(ProcessError::Pipe {
                    source: io::Error::other("stdout reader exited without a result"),
                });
            }
        };

        let Some(status) = wait_until(&mut child, deadline)? else {
            kill_and_reap(&mut child);
            return Err(self.timed_out(started));
        };

        if !status.success() {
            let stderr = stderr_rx
                .recv_timeout(STDERR_GRACE)
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
            return Err(ProcessError::Crashed {
                status: describe_status(status),
                stderr: stderr_tail(&stderr),
            });
        }

        Ok(stdout)
    }

    /// Reports the configured limit, not the measured wait, so repeated runs
    /// render the same diagnostic.
    fn timed_out(&self, started: Instant) -> ProcessError {
        ProcessError::TimedOut {
            after: self.timeout.unwrap_or_else(|| started.elapsed()),
        }
    }
}

impl Subject for SubjectInvoker {
    fn run_simulation(
        &self,
        args: &[String],
        input: &Path,
    ) -> Result<Vec<String>, ProcessError> {
        let bytes = fs::read(input).map_err(|source| ProcessError::Input {
            path: input.to_path_buf(),
            source,
        })?;
        let stdout = self.capture(args, bytes)?;
        Ok(filter_output_lines(&String::from_utf8_lossy(&stdout)))
    }
}

/// Keep only the lines that start with [`OUTPUT_MARKER`].
#[must_use]
pub fn filter_output_lines(stdout: &str) -> Vec<String> {
    stdout
        .split('\n')
        .filter(|line| line.starts_with(OUTPUT_MARKER))
        .map(str::to_string)
        .collect()
}

fn drain<R>(pipe: Option<R>) -> Receiver<io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = match pipe {
            Some(mut pipe) => pipe.read_to_end(&mut buf).map(|_| buf),
            None => Ok(buf),
        };
        let _ = tx.send(result);
    });
    rx
}

fn recv_by<T>(rx: &Receiver<T>, deadline: Option<Instant>) -> Result<T, RecvTimeoutError> {
    match deadline {
        Some(deadline) => rx.recv_deadline(deadline),
        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
    }
}

/// Wait for exit; `None` means the deadline passed first.
fn wait_until(
    child: &mut Child,
    deadline: Option<Instant>,
) -> Result<Option<ExitStatus>, ProcessError> {
    let Some(deadline) = deadline else {
        return child
            .wait()
            .map(Some)
            .map_err(|source| ProcessError::Pipe { source });
    };
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|source| ProcessError::Pipe { source })?
        {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(WAIT_POLL);
    }
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => status.to_string(),
    }
}

fn stderr_tail(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
