//! Error types for the wrapper.

/// Everything that can go wrong while driving the external CLI.
///
/// Failures from the subprocess are always surfaced as one of these —
/// never swallowed. The one exception is logout during scope exit,
/// which [`crate::ScopedSession`] downgrades to a warning log.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The `bw` executable could not be located on `PATH`.
    #[error("Bitwarden CLI `{0}` could not be found")]
    CliNotFound(String),

    /// An external program failed to start at all.
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Login was rejected, or no session token could be parsed from
    /// the CLI's output.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The CLI reported that the username or password is incorrect.
    #[error("username or password is incorrect")]
    BadCredentials,

    /// A query was attempted without a live session token.
    #[error("not logged in")]
    NotLoggedIn,

    /// A lookup had no match, or matched more than one item.
    #[error("no vault item matched `{0}`")]
    NotFound(String),

    /// The password prompt program is missing, was cancelled, or
    /// produced no output.
    #[error("password prompt unavailable: {0}")]
    PromptUnavailable(String),

    /// The CLI exited non-zero for a reason the caller did not expect
    /// to handle. Carries the exit status and captured stderr.
    #[error("`bw {command}` exited with status {status}: {stderr}")]
    Command {
        command: String,
        status: i32,
        stderr: String,
    },

    /// The CLI printed something that was supposed to be JSON and is not.
    #[error("`bw {command}` returned malformed JSON: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// Pipe plumbing to or from a child process failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
