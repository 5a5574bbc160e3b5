//! Interactive password prompting via an external askpass program.
//!
//! The contract is the askpass convention: the program receives the
//! prompt label as its single argument, asks the user with input
//! masking however it sees fit (GUI dialog, TTY), and prints the secret
//! as one line on stdout. Exit status 0 means confirmed; anything else
//! is treated as cancellation.
//!
//! There is deliberately no fallback chain behind this: in a headless
//! environment with no prompt program the call fails with
//! [`Error::PromptUnavailable`], and callers that cannot prompt are
//! expected to supply the password upfront instead.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;
use zeroize::Zeroizing;

use crate::error::Error;

/// Pick the prompt program: an explicit override wins, else the
/// `SSH_ASKPASS` environment variable, else prompting is unavailable.
pub fn resolve_program(override_path: Option<&Path>) -> Result<PathBuf, Error> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }
    if let Ok(askpass) = std::env::var("SSH_ASKPASS")
        && !askpass.is_empty()
    {
        return Ok(PathBuf::from(askpass));
    }
    Err(Error::PromptUnavailable(
        "no prompt program configured and SSH_ASKPASS is unset".to_string(),
    ))
}

/// Launch `program` with `label` as its only argument and read a single
/// line of output as the password.
pub fn read_password(program: &Path, label: &str) -> Result<Zeroizing<String>, Error> {
    debug!(program = %program.display(), "launching password prompt");

    let mut child = Command::new(program)
        .arg(label) // prompt text as argv[1] (askpass convention)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| {
            Error::PromptUnavailable(format!("`{}` failed to launch: {e}", program.display()))
        })?;

    // Read exactly one line from stdout into a zeroizing buffer.
    let mut password = Zeroizing::new(String::new());
    {
        let Some(stdout) = child.stdout.take() else {
            return Err(Error::PromptUnavailable(
                "prompt program has no stdout pipe".to_string(),
            ));
        };
        let mut reader = BufReader::new(stdout);
        reader
            .read_line(&mut password)
            .map_err(|e| Error::PromptUnavailable(format!("prompt read error: {e}")))?;
        // Reader dropped here (closes the pipe read end) before waiting.
    }

    // Trim the trailing newline in-place without reallocating.
    while password.ends_with('\n') || password.ends_with('\r') {
        let new_len = password.len() - 1;
        // SAFETY: ASCII control chars are single-byte.
        unsafe { password.as_mut_vec().truncate(new_len) };
    }

    let status = child
        .wait()
        .map_err(|e| Error::PromptUnavailable(format!("prompt wait error: {e}")))?;
    if !status.success() {
        return Err(Error::PromptUnavailable(format!(
            "`{}` exited with {status}",
            program.display()
        )));
    }
    if password.is_empty() {
        return Err(Error::PromptUnavailable(
            "prompt returned an empty password".to_string(),
        ));
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TEST_ENV_MUTEX;
    use crate::testutil::fake_program;

    #[test]
    fn reads_one_line_and_strips_newline() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_program(dir.path(), "askpass", "echo 'hunter2'");
        let password = read_password(&program, "Password:").unwrap();
        assert_eq!(password.as_str(), "hunter2");
    }

    #[test]
    fn label_is_passed_as_first_argument() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_program(dir.path(), "askpass", "printf '%s' \"$1\"");
        let echoed = read_password(&program, "Vault password for alice").unwrap();
        assert_eq!(echoed.as_str(), "Vault password for alice");
    }

    #[test]
    fn cancellation_is_prompt_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_program(dir.path(), "askpass", "exit 1");
        let err = read_password(&program, "Password:").unwrap_err();
        assert!(matches!(err, Error::PromptUnavailable(_)));
    }

    #[test]
    fn empty_output_is_prompt_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_program(dir.path(), "askpass", "exit 0");
        let err = read_password(&program, "Password:").unwrap_err();
        assert!(matches!(err, Error::PromptUnavailable(_)));
    }

    #[test]
    fn missing_program_is_prompt_unavailable() {
        let err = read_password(Path::new("/nonexistent/askpass"), "Password:").unwrap_err();
        assert!(matches!(err, Error::PromptUnavailable(_)));
    }

    #[test]
    fn explicit_override_wins() {
        let program = resolve_program(Some(Path::new("/opt/my-askpass"))).unwrap();
        assert_eq!(program, PathBuf::from("/opt/my-askpass"));
    }

    #[test]
    fn falls_back_to_ssh_askpass_env() {
        let _guard = TEST_ENV_MUTEX.lock().unwrap();
        unsafe { std::env::set_var("SSH_ASKPASS", "/usr/lib/ssh/x11-ssh-askpass") };
        let program = resolve_program(None).unwrap();
        unsafe { std::env::remove_var("SSH_ASKPASS") };
        assert_eq!(program, PathBuf::from("/usr/lib/ssh/x11-ssh-askpass"));
    }

    #[test]
    fn unavailable_without_any_program() {
        let _guard = TEST_ENV_MUTEX.lock().unwrap();
        unsafe { std::env::remove_var("SSH_ASKPASS") };
        let err = resolve_program(None).unwrap_err();
        assert!(matches!(err, Error::PromptUnavailable(_)));
    }
}
