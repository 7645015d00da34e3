//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action to run, here always the API
//! server with its full configuration.

use crate::api::ApiConfig;
use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, database, protection};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5000);

    let database_opts = database::Options::parse(matches)?;
    let protection_opts = protection::Options::parse(matches)?;

    let api = ApiConfig::new()
        .with_port(port)
        .with_protection(protection_opts.protection)
        .with_login_requests_per_minute(protection_opts.login_requests_per_minute)
        .with_default_requests_per_minute(protection_opts.default_requests_per_minute)
        .with_trust_forwarded_for(protection_opts.trust_forwarded_for)
        .with_prune_interval_seconds(protection_opts.prune_interval_seconds)
        .with_cors_allow_origin(protection_opts.cors_allow_origin);

    Ok(Action::Server(Args {
        dsn: database_opts.dsn,
        api,
    }))
}
