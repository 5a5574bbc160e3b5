//! Session lifecycle over the Bitwarden CLI.
//!
//! A [`Session`] owns the opaque session token the CLI hands out at
//! login and attaches it to every subsequent query. The token never
//! leaves the session object: it is not exposed through the public
//! API, not serialized, and redacted from `Debug` output.
//!
//! For scope-bound use, [`Session::open`] (or [`Session::scoped`])
//! returns a [`ScopedSession`] guard that logs out when dropped —
//! including when the scope unwinds from a panic.

use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

use serde_json::Value;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::error::Error;
use crate::exec::BwCli;
use crate::prompt;
use crate::types::{Field, ListFilters, ObjectKind};

/// Configuration for a [`Session`].
#[derive(Clone, Default)]
pub struct SessionConfig {
    /// Account email address.
    pub username: String,
    /// Master password. When absent, `login` falls back to the
    /// interactive prompt program.
    pub password: Option<Zeroizing<String>>,
    /// Explicit path to the `bw` executable. When absent, `PATH` is
    /// searched.
    pub executable: Option<PathBuf>,
    /// Explicit askpass program. When absent, `SSH_ASKPASS` is tried.
    pub prompt_program: Option<PathBuf>,
}

impl SessionConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn with_prompt_program(mut self, path: impl Into<PathBuf>) -> Self {
        self.prompt_program = Some(path.into());
        self
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("executable", &self.executable)
            .field("prompt_program", &self.prompt_program)
            .finish()
    }
}

/// A single session against the external vault CLI.
///
/// Created unauthenticated; [`login`](Self::login) populates the token
/// or fails; [`logout`](Self::logout) clears it. The object is
/// reusable across multiple login/logout cycles.
pub struct Session {
    config: SessionConfig,
    cli: BwCli,
    token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.config.username)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl Session {
    /// Create an unauthenticated session.
    ///
    /// Fails with [`Error::CliNotFound`] when no executable override
    /// is configured and `bw` is not on `PATH`.
    pub fn new(config: SessionConfig) -> Result<Self, Error> {
        let cli = match &config.executable {
            Some(path) => BwCli::with_program(path.clone()),
            None => BwCli::locate()?,
        };
        Ok(Self {
            config,
            cli,
            token: None,
        })
    }

    /// Log in (prompting if needed) and wrap the session in a guard
    /// that logs out on drop.
    pub fn open(config: SessionConfig) -> Result<ScopedSession, Error> {
        Self::new(config)?.scoped()
    }

    pub fn username(&self) -> &str {
        &self.config.username
    }

    /// Whether a session token is currently held.
    pub fn authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The live token, or the fast-fail every query goes through.
    fn token(&self) -> Result<&str, Error> {
        match &self.token {
            Some(token) => Ok(token.as_str()),
            None => Err(Error::NotLoggedIn),
        }
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Log in and store the session token.
    ///
    /// Password precedence: the `password` argument, else the one
    /// supplied at construction, else the interactive prompt program.
    /// Logging in over a live token replaces it.
    pub fn login(&mut self, password: Option<&str>) -> Result<(), Error> {
        let prompted;
        let password: &str = match password {
            Some(given) => given,
            None => match &self.config.password {
                Some(configured) => configured.as_str(),
                None => {
                    let program =
                        prompt::resolve_program(self.config.prompt_program.as_deref())?;
                    let label =
                        format!("Enter the Bitwarden password for {}", self.config.username);
                    prompted = prompt::read_password(&program, &label)?;
                    prompted.as_str()
                }
            },
        };

        let output = self
            .cli
            .run(&["login", &self.config.username, "--raw"], Some(password), None)?;

        if output.stderr.contains("API key client_secret") {
            return Err(Error::Auth(
                "the CLI must first be authenticated with an API key (bw login --apikey)"
                    .to_string(),
            ));
        }
        if output.stderr.contains("Username or password is incorrect") {
            return Err(Error::BadCredentials);
        }
        let token = output.stdout.trim();
        if !output.success() || token.is_empty() {
            return Err(Error::Auth(output.stderr.trim().to_string()));
        }

        self.token = Some(Zeroizing::new(token.to_string()));
        info!(username = %self.config.username, "logged in");
        Ok(())
    }

    /// Log out and discard the session token.
    ///
    /// Idempotent: with no live token this is a no-op. The token is
    /// cleared even when the CLI reports a failure, so a wedged remote
    /// state can never pin the session; `not logged in` from the CLI
    /// counts as success.
    pub fn logout(&mut self) -> Result<(), Error> {
        let Some(token) = self.token.take() else {
            return Ok(());
        };
        let output = self.cli.run(&["logout"], None, Some(token.as_str()))?;
        if output.success() || output.stderr.contains("not logged in") {
            info!(username = %self.config.username, "logged out");
            return Ok(());
        }
        Err(Error::Command {
            command: "logout".to_string(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        })
    }

    /// Log in (using the configured password, else the prompt) and
    /// return a guard whose drop performs the logout.
    pub fn scoped(mut self) -> Result<ScopedSession, Error> {
        self.login(None)?;
        Ok(ScopedSession { inner: Some(self) })
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Raw `bw get`: returns stdout verbatim, trimmed.
    ///
    /// A non-zero exit means the search had no match or an ambiguous
    /// one, and maps to [`Error::NotFound`].
    pub fn get(&self, field: Field, ident: &str) -> Result<String, Error> {
        let token = self.token()?;
        let output = self
            .cli
            .run(&["get", field.as_str(), ident], None, Some(token))?;
        if !output.success() {
            return Err(Error::NotFound(ident.to_string()));
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Fetch a single item by name or id, parsed as JSON.
    ///
    /// The result is passed through with whatever shape the CLI
    /// emitted; no schema is imposed.
    pub fn get_item(&self, ident: &str) -> Result<Value, Error> {
        self.get_json(&["get", "item", ident], ident)
    }

    /// Fetch an object template for creation or editing.
    pub fn get_template(&self, kind: &str) -> Result<Value, Error> {
        self.get_json(&["get", "template", kind], kind)
    }

    fn get_json(&self, args: &[&str], ident: &str) -> Result<Value, Error> {
        let token = self.token()?;
        let output = self.cli.run(args, None, Some(token))?;
        if !output.success() {
            return Err(Error::NotFound(ident.to_string()));
        }
        parse_payload(&output.stdout, &args.join(" "))
    }

    /// List vault objects, rendering each set filter as a CLI flag.
    ///
    /// Returns the parsed records in the order the CLI printed them;
    /// an empty array is a valid result.
    pub fn list(&self, kind: ObjectKind, filters: &ListFilters) -> Result<Vec<Value>, Error> {
        let token = self.token()?;
        let mut args = vec!["list".to_string(), kind.as_str().to_string()];
        args.extend(filters.to_args());
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.cli.run_checked(&arg_refs, None, Some(token))?;
        parse_payload(&stdout, &format!("list {kind}"))
    }
}

/// Parse the JSON payload from a CLI reply.
///
/// Stderr is never parsed; on stdout, anything before the first `{` or
/// `[` is skipped — the CLI is known to print upgrade hints and
/// warnings ahead of the payload. Trailing garbage still fails.
fn parse_payload<T>(stdout: &str, command: &str) -> Result<T, Error>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(json_start(stdout)).map_err(|source| Error::Parse {
        command: command.to_string(),
        source,
    })
}

/// Slice from the first `{` or `[` onward.
fn json_start(raw: &str) -> &str {
    match raw.find(['{', '[']) {
        Some(idx) => &raw[idx..],
        None => raw.trim(),
    }
}

// ---------------------------------------------------------------------------
// Scoped sessions
// ---------------------------------------------------------------------------

/// A logged-in [`Session`] that logs out when dropped.
///
/// Obtained from [`Session::open`] or [`Session::scoped`]. The logout
/// runs on every exit path, including unwinding; a failure during drop
/// is logged at warn level rather than surfaced. Use
/// [`finish`](Self::finish) to observe the logout result and recover
/// the session for another login cycle.
pub struct ScopedSession {
    inner: Option<Session>,
}

impl ScopedSession {
    /// Log out explicitly, surfacing any error, and hand the reusable
    /// session back.
    pub fn finish(mut self) -> (Session, Result<(), Error>) {
        let mut session = self
            .inner
            .take()
            .expect("guard holds a session until finished or dropped");
        let result = session.logout();
        (session, result)
    }
}

impl Deref for ScopedSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.inner
            .as_ref()
            .expect("guard holds a session until finished or dropped")
    }
}

impl DerefMut for ScopedSession {
    fn deref_mut(&mut self) -> &mut Session {
        self.inner
            .as_mut()
            .expect("guard holds a session until finished or dropped")
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        let Some(mut session) = self.inner.take() else {
            return;
        };
        if let Err(err) = session.logout() {
            warn!(username = %session.username(), "logout during scope exit failed: {err}");
        }
    }
}
