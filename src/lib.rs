//! # Loginguard
//!
//! `loginguard` is a login service that defends password authentication against
//! brute-force and credential-stuffing attacks.
//!
//! ## Protection
//!
//! Every failed login against an existing account is appended to a shared log
//! of failed attempts, keyed by account and by origin address. Two checks run
//! before any password is verified:
//!
//! - **Origin blocking:** an address with too many failures in the trailing
//!   window is refused for any account until old failures age out.
//! - **Account suspension:** an account with too many failures in the trailing
//!   window is locked for a fixed period after its most recent failure.
//!
//! Failures against unknown accounts are never logged, so the log cannot be
//! used to learn which accounts exist. A successful login clears the account's
//! failures. All counts live in `PostgreSQL`, so several instances can share
//! one database.
//!
//! ## Request throttling
//!
//! Independently of the checks above, an in-process rate limiter caps how many
//! requests per minute each origin may send to the API.

pub mod api;
pub mod cli;
pub mod guard;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
