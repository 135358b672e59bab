//! Resolving the author/committer identity stamped into a commit.
//! Grounded on the teacher's `CommitAttribution` (commit.rs), whose
//! `yours_truly()` stub is replaced here with real environment/`whoami`
//! lookups, following sourcefrog-conserve's `whoami::realname()` /
//! `whoami::fallible::hostname()` usage pattern.

use std::time::{SystemTime, UNIX_EPOCH};

/// A resolved name/email/timestamp triple ready to stamp into a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
    /// `<unix seconds> <zone offset>`, e.g. `1700000000 +0000`.
    pub when: String,
}

impl Identity {
    /// Resolve from `COMMITTER_NAME` / `COMMITTER_EMAIL` / `COMMITTER_DATE`,
    /// falling back to the local user's real name, username, and hostname,
    /// and the current time. Control characters that would break the
    /// commit's line-oriented framing (`\n`, `<`, `>`) are stripped from
    /// name and email after any environment override is applied.
    pub fn resolve() -> Self {
        let name = std::env::var("COMMITTER_NAME")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(default_name);
        let email = std::env::var("COMMITTER_EMAIL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(default_email);
        let when = std::env::var("COMMITTER_DATE")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(default_when);

        Identity {
            name: strip_forbidden(&name),
            email: strip_forbidden(&email),
            when,
        }
    }
}

fn default_name() -> String {
    let real = whoami::realname();
    if real.is_empty() {
        whoami::username()
    } else {
        real
    }
}

fn default_email() -> String {
    let user = whoami::username();
    let host = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_owned());
    format!("{user}@{host}")
}

fn default_when() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{secs} +0000")
}

fn strip_forbidden(s: &str) -> String {
    s.chars().filter(|&c| c != '\n' && c != '<' && c != '>').collect()
}
