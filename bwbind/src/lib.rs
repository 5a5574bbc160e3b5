//! Session-scoped bindings for the Bitwarden CLI.
//!
//! Wraps an installed `bw` binary with a [`Session`] object that manages
//! login/logout and item lookups. No vault storage, encryption, or sync
//! logic lives here — every operation shells out to the external tool
//! and passes its JSON output through verbatim.
//!
//! # Architecture
//!
//! - **`session`**: [`Session`] lifecycle (login, logout, queries) and the
//!   [`ScopedSession`] drop guard
//! - **`exec`**: subprocess invocation of the `bw` binary
//! - **`prompt`**: interactive password prompting via an askpass program
//! - **`types`**: request vocabulary ([`Field`], [`ObjectKind`], [`ListFilters`])
//! - **`error`**: the [`Error`] taxonomy
//!
//! # Usage
//!
//! ```rust,ignore
//! use bwbind::{Session, SessionConfig};
//!
//! let config = SessionConfig::new("user@example.com").with_password("hunter2");
//! let session = Session::open(config)?; // logs in; logs out on drop
//! let item = session.get_item("github")?;
//! println!("{}", item["login"]["username"]);
//! ```
//!
//! Without a construction-time password, `login` launches an external
//! askpass program (explicitly configured, else `$SSH_ASKPASS`). That
//! call blocks on user interaction and fails in headless environments;
//! callers that cannot prompt must supply the password upfront.

pub mod error;
pub mod exec;
pub mod prompt;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::Error;
pub use exec::{BwCli, CliOutput};
pub use session::{ScopedSession, Session, SessionConfig};
pub use types::{Field, ListFilters, ObjectKind};

/// Crate-wide mutex used by tests that mutate process environment
/// variables (`SSH_ASKPASS`, `PATH`).
///
/// Those tests call `unsafe { env::set_var(...) }`; a single
/// process-wide lock prevents races when they run in parallel in the
/// same test binary.
#[cfg(test)]
pub(crate) static TEST_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
