//! Shared helpers for tests that fake the external programs.
//!
//! Real `bw` is never touched: tests generate small shell scripts in a
//! tempdir and point the wrapper at them. Each generated script exports
//! `LOG` (an append-only call log inside the same tempdir) and records
//! its own argv there before running the test-supplied body, so tests
//! can assert exactly which invocations happened and in what order.
//!
//! Unix-only, like the rest of the test suite's process plumbing.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Write an executable `/bin/sh` script into `dir` and return its path.
pub(crate) fn fake_program(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// A fake `bw` binary that logs every invocation.
///
/// The script appends one `argv` line per call to `calls.log`, then
/// runs `body` with `$LOG` pointing at that log. Bodies typically
/// dispatch on `$1` to produce canned stdout per subcommand.
pub(crate) struct FakeBw {
    pub dir: TempDir,
    pub program: PathBuf,
}

impl FakeBw {
    pub fn with_body(body: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let script = format!(
            "LOG=\"{log}\"\necho \"$@\" >> \"$LOG\"\n{body}",
            log = log.display()
        );
        let program = fake_program(dir.path(), "bw", &script);
        Self { dir, program }
    }

    /// A well-behaved vault: login yields a token, logout succeeds,
    /// `get item` and `list` print small JSON payloads.
    pub fn happy() -> Self {
        Self::with_body(
            r#"case "$1" in
  login) IFS= read -r _pw; printf 'tok_123' ;;
  logout) exit 0 ;;
  get) printf '{"login":{"username":"u","password":"p"}}' ;;
  list) printf '[{"id":"one"},{"id":"two"}]' ;;
esac"#,
        )
    }

    /// Argv lines (plus any lines the body appended), oldest first.
    pub fn calls(&self) -> Vec<String> {
        let log = self.dir.path().join("calls.log");
        if !log.exists() {
            return Vec::new();
        }
        fs::read_to_string(log)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Count of recorded invocations of a given subcommand.
    pub fn count_of(&self, subcommand: &str) -> usize {
        self.calls()
            .iter()
            .filter(|line| line.starts_with(subcommand))
            .count()
    }
}
