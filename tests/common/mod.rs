#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_cachegrade") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) {
        "cachegrade.exe"
    } else {
        "cachegrade"
    };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve cachegrade binary path for integration test"),
    }
}

/// Run the CLI from the current directory.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_in(case_name, None, args)
}

/// Run the CLI, optionally from `cwd`, with `CACHEGRADE_*` overrides cleared.
pub fn run_cli_case_in(case_name: &str, cwd: Option<&Path>, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("cachegrade-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command.args(args).env("RUST_BACKTRACE", "1");
    for (key, _) in std::env::vars() {
        if key.starts_with("CACHEGRADE_") {
            command.env_remove(key);
        }
    }
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let output = command.output().expect("execute cachegrade command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// A throwaway grading root: `inputs/`, `expected/` and a `cachesim` script.
pub struct GradingLayout {
    pub dir: tempfile::TempDir,
}

impl GradingLayout {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create grading root");
        fs::create_dir_all(dir.path().join("inputs")).expect("create inputs dir");
        fs::create_dir_all(dir.path().join("expected")).expect("create expected dir");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn root_arg(&self) -> String {
        self.root().display().to_string()
    }

    pub fn input(&self, name: &str, body: &str) -> &Self {
        fs::write(self.root().join("inputs").join(name), body).expect("write input fixture");
        self
    }

    pub fn expected(&self, name: &str, body: &str) -> &Self {
        fs::write(self.root().join("expected").join(name), body).expect("write expected fixture");
        self
    }

    /// Install `./cachesim` as a shell script with the given body.
    #[cfg(unix)]
    pub fn simulator(&self, body: &str) -> &Self {
        use std::os::unix::fs::PermissionsExt;

        let path = self.root().join("cachesim");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write simulator script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("mark simulator executable");
        self
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root().join("test_results")
    }

    /// Result artifacts (`*.json`) currently in `test_results/`.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.results_dir()) else {
            return Vec::new();
        };
        let mut found: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        found.sort();
        found
    }
}
