//! Suspension, blocking and throttling arguments.

use crate::guard::ProtectionConfig;
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_USER_THRESHOLD: &str = "user-threshold";
pub const ARG_USER_WINDOW_MINUTES: &str = "user-window-minutes";
pub const ARG_SUSPENSION_MINUTES: &str = "suspension-minutes";
pub const ARG_IP_THRESHOLD: &str = "ip-threshold";
pub const ARG_IP_WINDOW_MINUTES: &str = "ip-window-minutes";
pub const ARG_LOGIN_REQUESTS_PER_MINUTE: &str = "login-requests-per-minute";
pub const ARG_DEFAULT_REQUESTS_PER_MINUTE: &str = "default-requests-per-minute";
pub const ARG_TRUST_FORWARDED_FOR: &str = "trust-forwarded-for";
pub const ARG_PRUNE_INTERVAL_SECONDS: &str = "prune-interval-seconds";
pub const ARG_CORS_ALLOW_ORIGIN: &str = "cors-allow-origin";

#[derive(Debug)]
pub struct Options {
    pub protection: ProtectionConfig,
    pub login_requests_per_minute: u32,
    pub default_requests_per_minute: u32,
    pub trust_forwarded_for: bool,
    pub prune_interval_seconds: u64,
    pub cors_allow_origin: String,
}

impl Options {
    /// Parse protection arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is unexpectedly absent.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let read_u32 = |id: &str| -> Result<u32> {
            matches
                .get_one::<u32>(id)
                .copied()
                .with_context(|| format!("missing required argument: --{id}"))
        };
        let read_minutes = |id: &str| -> Result<i64> {
            matches
                .get_one::<u32>(id)
                .copied()
                .map(i64::from)
                .with_context(|| format!("missing required argument: --{id}"))
        };

        let protection = ProtectionConfig::new()
            .with_user_threshold(read_u32(ARG_USER_THRESHOLD)?)
            .with_user_window_minutes(read_minutes(ARG_USER_WINDOW_MINUTES)?)
            .with_suspension_minutes(read_minutes(ARG_SUSPENSION_MINUTES)?)
            .with_ip_threshold(read_u32(ARG_IP_THRESHOLD)?)
            .with_ip_window_minutes(read_minutes(ARG_IP_WINDOW_MINUTES)?);

        Ok(Self {
            protection,
            login_requests_per_minute: read_u32(ARG_LOGIN_REQUESTS_PER_MINUTE)?,
            default_requests_per_minute: read_u32(ARG_DEFAULT_REQUESTS_PER_MINUTE)?,
            trust_forwarded_for: matches.get_flag(ARG_TRUST_FORWARDED_FOR),
            prune_interval_seconds: matches
                .get_one::<u64>(ARG_PRUNE_INTERVAL_SECONDS)
                .copied()
                .context("missing required argument: --prune-interval-seconds")?,
            cors_allow_origin: matches
                .get_one::<String>(ARG_CORS_ALLOW_ORIGIN)
                .cloned()
                .context("missing required argument: --cors-allow-origin")?,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_suspension_args(command);
    let command = with_block_args(command);
    with_throttle_args(command)
}

fn positive_u32() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..)
}

fn with_suspension_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_USER_THRESHOLD)
                .long(ARG_USER_THRESHOLD)
                .help("Failed attempts within the user window that suspend an account")
                .env("LOGINGUARD_USER_THRESHOLD")
                .default_value("5")
                .value_parser(positive_u32()),
        )
        .arg(
            Arg::new(ARG_USER_WINDOW_MINUTES)
                .long(ARG_USER_WINDOW_MINUTES)
                .help("Trailing window in minutes for counting an account's failures")
                .env("LOGINGUARD_USER_WINDOW_MINUTES")
                .default_value("5")
                .value_parser(positive_u32()),
        )
        .arg(
            Arg::new(ARG_SUSPENSION_MINUTES)
                .long(ARG_SUSPENSION_MINUTES)
                .help("Minutes an account stays suspended after its latest failure")
                .env("LOGINGUARD_SUSPENSION_MINUTES")
                .default_value("15")
                .value_parser(positive_u32()),
        )
}

fn with_block_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_IP_THRESHOLD)
                .long(ARG_IP_THRESHOLD)
                .help("Failed attempts within the IP window that block an origin address")
                .env("LOGINGUARD_IP_THRESHOLD")
                .default_value("100")
                .value_parser(positive_u32()),
        )
        .arg(
            Arg::new(ARG_IP_WINDOW_MINUTES)
                .long(ARG_IP_WINDOW_MINUTES)
                .help("Trailing window in minutes for counting an origin's failures")
                .env("LOGINGUARD_IP_WINDOW_MINUTES")
                .default_value("5")
                .value_parser(positive_u32()),
        )
        .arg(
            Arg::new(ARG_TRUST_FORWARDED_FOR)
                .long(ARG_TRUST_FORWARDED_FOR)
                .help("Take the client address from X-Forwarded-For / X-Real-IP (only behind a trusted proxy)")
                .env("LOGINGUARD_TRUST_FORWARDED_FOR")
                .action(ArgAction::SetTrue),
        )
}

fn with_throttle_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_LOGIN_REQUESTS_PER_MINUTE)
                .long(ARG_LOGIN_REQUESTS_PER_MINUTE)
                .help("Requests per minute each origin may send to the login route")
                .env("LOGINGUARD_LOGIN_REQUESTS_PER_MINUTE")
                .default_value("5")
                .value_parser(positive_u32()),
        )
        .arg(
            Arg::new(ARG_DEFAULT_REQUESTS_PER_MINUTE)
                .long(ARG_DEFAULT_REQUESTS_PER_MINUTE)
                .help("Requests per minute each origin may send to other routes")
                .env("LOGINGUARD_DEFAULT_REQUESTS_PER_MINUTE")
                .default_value("10")
                .value_parser(positive_u32()),
        )
        .arg(
            Arg::new(ARG_PRUNE_INTERVAL_SECONDS)
                .long(ARG_PRUNE_INTERVAL_SECONDS)
                .help("Seconds between stale failed attempt cleanups")
                .env("LOGINGUARD_PRUNE_INTERVAL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_CORS_ALLOW_ORIGIN)
                .long(ARG_CORS_ALLOW_ORIGIN)
                .help("Allowed CORS origin, `*` for any")
                .env("LOGINGUARD_CORS_ALLOW_ORIGIN")
                .default_value("*"),
        )
}
