//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use amux_adapters::FakeTmuxDriver;
use amux_core::SystemClock;
use amux_engine::{Engine, Tuning};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Duration;

/// Returns the path to the amux binary, resolving relative to the test
/// binary when CARGO_MANIFEST_DIR is stale (e.g. a shared target dir).
fn binary_path() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let standard = manifest_dir.join("target/debug/amux");
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>, so its
    // grandparent is target/debug/ where amux is built.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("amux");
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

/// An isolated config home plus a handle for invoking the CLI against it.
pub struct Project {
    pub home: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    /// Start building an amux invocation against this project's home.
    pub fn amux(&self) -> Amux {
        let mut cmd = Command::new(binary_path());
        cmd.env("AMUX_HOME", self.home.path());
        Amux { cmd }
    }

    /// Engine wired to the fake driver and this project's home.
    pub fn engine(&self) -> Engine<FakeTmuxDriver, SystemClock> {
        Engine::new(
            FakeTmuxDriver::new(),
            SystemClock,
            self.home.path().to_path_buf(),
            "spec",
        )
        .with_tuning(fast_tuning())
    }

    /// A second engine over the same home and the same fake tmux server,
    /// modeling another control-plane process.
    pub fn engine_sharing(
        &self,
        other: &Engine<FakeTmuxDriver, SystemClock>,
    ) -> Engine<FakeTmuxDriver, SystemClock> {
        Engine::new(
            other.driver.clone(),
            SystemClock,
            self.home.path().to_path_buf(),
            "spec",
        )
        .with_tuning(fast_tuning())
    }

    /// Seed a workspace record rooted at /tmp.
    pub fn seed_workspace(&self, id: &str) {
        self.engine()
            .workspaces()
            .save(&amux_core::Workspace::new(
                id,
                PathBuf::from("/tmp"),
                "claude",
            ))
            .unwrap();
    }
}

/// Millisecond-scale engine tuning so specs finish fast.
pub fn fast_tuning() -> Tuning {
    Tuning {
        ready_poll: Duration::from_millis(1),
        ready_wait: Duration::from_millis(30),
        delivery_wait: Duration::from_millis(50),
        queue_poll: Duration::from_millis(1),
        queue_max_wait: Duration::from_secs(2),
        capture_lines: 200,
        wait_poll: Duration::from_millis(1),
    }
}

/// Builder for one CLI invocation.
pub struct Amux {
    cmd: Command,
}

impl Amux {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn run(mut self) -> Checked {
        let output = self.cmd.output().unwrap();
        Checked { output }
    }

    /// Run and require exit code 0.
    pub fn passes(self) -> Checked {
        let checked = self.run();
        assert_eq!(
            checked.code(),
            0,
            "expected success, got {}: stderr={}",
            checked.code(),
            checked.stderr()
        );
        checked
    }

    /// Run and require the given non-zero exit code.
    pub fn fails_with(self, code: i32) -> Checked {
        let checked = self.run();
        assert_eq!(
            checked.code(),
            code,
            "expected exit {}, got {}: stdout={} stderr={}",
            code,
            checked.code(),
            checked.stdout(),
            checked.stderr()
        );
        checked
    }
}

/// Assertions over a finished invocation.
pub struct Checked {
    output: Output,
}

impl Checked {
    pub fn code(&self) -> i32 {
        self.output.status.code().unwrap_or(-1)
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).to_string()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).to_string()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout().contains(needle),
            "stdout missing {:?}: {}",
            needle,
            self.stdout()
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr().contains(needle),
            "stderr missing {:?}: {}",
            needle,
            self.stderr()
        );
        self
    }

    pub fn stderr_empty(self) -> Self {
        assert!(
            self.output.stderr.is_empty(),
            "expected empty stderr: {}",
            self.stderr()
        );
        self
    }

    /// Parse stdout as a single JSON envelope line.
    pub fn envelope(&self) -> serde_json::Value {
        let stdout = self.stdout();
        let line = stdout.trim_end_matches('\n');
        assert!(!line.contains('\n'), "expected one envelope line: {}", stdout);
        serde_json::from_str(line).unwrap()
    }
}
