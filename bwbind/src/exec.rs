//! Subprocess invocation of the Bitwarden CLI.
//!
//! [`BwCli`] is a deliberately narrow helper: it locates the binary,
//! builds an argument vector, runs one blocking child process, and
//! hands back stdout/stderr/exit status untouched. Interpretation of
//! the output — token parsing, JSON decoding, stderr classification —
//! belongs to the caller.
//!
//! Two invariants are enforced here rather than left to callers:
//!
//! - Secrets travel over the stdin pipe, never through argv, so they
//!   cannot show up in process listings.
//! - A session token is attached both as `--session <token>` and as
//!   the `BW_SESSION` environment variable, matching how the CLI
//!   itself expects to receive it.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::Error;

/// Name of the external binary when no explicit path is configured.
pub const DEFAULT_PROGRAM: &str = "bw";

/// Captured result of a single CLI invocation.
///
/// Stdout and stderr are decoded lossily; the CLI talks UTF-8 but a
/// stray byte in an error message must not turn into a second failure.
#[derive(Debug)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl CliOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Locator and runner for the external `bw` binary.
#[derive(Debug, Clone)]
pub struct BwCli {
    program: PathBuf,
}

impl BwCli {
    /// Use an explicit executable path, bypassing the `PATH` search.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locate `bw` on `PATH`.
    pub fn locate() -> Result<Self, Error> {
        let path = std::env::var_os("PATH").unwrap_or_default();
        search_path(DEFAULT_PROGRAM, &path)
            .map(|program| Self { program })
            .ok_or_else(|| Error::CliNotFound(DEFAULT_PROGRAM.to_string()))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the CLI and capture its output without interpreting it.
    ///
    /// `secret` is written to the child's stdin followed by a newline;
    /// `token` is attached as `--session` plus `BW_SESSION`. A spawn
    /// failure (binary missing, not executable) is [`Error::Spawn`];
    /// a non-zero exit is *not* an error at this layer.
    pub fn run(
        &self,
        args: &[&str],
        secret: Option<&str>,
        token: Option<&str>,
    ) -> Result<CliOutput, Error> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(token) = token {
            cmd.args(["--session", token]);
            cmd.env("BW_SESSION", token);
        }
        cmd.stdin(if secret.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        debug!(
            program = %self.program.display(),
            command = args.first().copied().unwrap_or(""),
            "invoking bw"
        );

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        if let Some(secret) = secret {
            let Some(mut stdin) = child.stdin.take() else {
                return Err(Error::Io(std::io::Error::other("child stdin not piped")));
            };
            // A child that fails before reading its stdin closes the
            // pipe; that failure surfaces through the exit status and
            // stderr, not as a write error here.
            match stdin
                .write_all(secret.as_bytes())
                .and_then(|()| stdin.write_all(b"\n"))
            {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
            // stdin dropped here → EOF sent to child
        }

        let output = child.wait_with_output()?;
        Ok(CliOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code().unwrap_or(-1),
        })
    }

    /// Like [`run`](Self::run), but treats a non-zero exit as
    /// [`Error::Command`] carrying the exit status and stderr.
    pub fn run_checked(
        &self,
        args: &[&str],
        secret: Option<&str>,
        token: Option<&str>,
    ) -> Result<String, Error> {
        let output = self.run(args, secret, token)?;
        if !output.success() {
            return Err(Error::Command {
                command: args.join(" "),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Search each `PATH` entry for an executable file named `name`.
fn search_path(name: &str, path: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(path) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeBw, fake_program};

    #[test]
    fn run_captures_stdout_and_status() {
        let fake = FakeBw::with_body("printf 'hello'");
        let cli = BwCli::with_program(&fake.program);
        let output = cli.run(&["get", "username", "x"], None, None).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "hello");
        assert_eq!(fake.calls(), vec!["get username x"]);
    }

    #[test]
    fn token_is_passed_as_flag_and_env() {
        let fake = FakeBw::with_body("echo \"env:$BW_SESSION\" >> \"$LOG\"");
        let cli = BwCli::with_program(&fake.program);
        cli.run(&["list", "items"], None, Some("tok_abc")).unwrap();
        let calls = fake.calls();
        assert_eq!(calls[0], "list items --session tok_abc");
        assert_eq!(calls[1], "env:tok_abc");
    }

    #[test]
    fn secret_goes_to_stdin_not_argv() {
        let fake = FakeBw::with_body("IFS= read -r secret\necho \"stdin:$secret\" >> \"$LOG\"");
        let cli = BwCli::with_program(&fake.program);
        cli.run(&["login", "user"], Some("hunter2"), None).unwrap();
        let calls = fake.calls();
        assert_eq!(calls[0], "login user");
        assert_eq!(calls[1], "stdin:hunter2");
    }

    #[test]
    fn run_checked_maps_nonzero_exit() {
        let fake = FakeBw::with_body("echo 'boom' >&2\nexit 3");
        let cli = BwCli::with_program(&fake.program);
        let err = cli.run_checked(&["sync"], None, None).unwrap_err();
        match err {
            Error::Command {
                command,
                status,
                stderr,
            } => {
                assert_eq!(command, "sync");
                assert_eq!(status, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected Command error, got {other:?}"),
        }
    }

    #[test]
    fn spawn_failure_is_reported() {
        let cli = BwCli::with_program("/nonexistent/bw");
        let err = cli.run(&["login"], None, None).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[test]
    fn search_path_finds_executables_only() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(search_path("bw", dir.path().as_os_str()), None);

        // A plain file without the execute bit must not match.
        std::fs::write(dir.path().join("bw"), "not a program").unwrap();
        assert_eq!(search_path("bw", dir.path().as_os_str()), None);

        let program = fake_program(dir.path(), "bw", "exit 0");
        assert_eq!(search_path("bw", dir.path().as_os_str()), Some(program));
    }
}
