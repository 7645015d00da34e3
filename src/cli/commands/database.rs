//! Database connection arguments.
//!
//! A full DSN wins when given; otherwise one is assembled from the discrete
//! host, port, name, user and password settings.

use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgMatches, Command};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

pub const ARG_DSN: &str = "dsn";
pub const ARG_DB_HOST: &str = "db-host";
pub const ARG_DB_PORT: &str = "db-port";
pub const ARG_DB_NAME: &str = "db-name";
pub const ARG_DB_USER: &str = "db-user";
pub const ARG_DB_PASSWORD: &str = "db-password";

#[derive(Debug)]
pub struct Options {
    pub dsn: SecretString,
}

impl Options {
    /// Parse database arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the DSN cannot be assembled.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        if let Some(dsn) = matches
            .get_one::<String>(ARG_DSN)
            .filter(|dsn| !dsn.trim().is_empty())
        {
            return Ok(Self {
                dsn: SecretString::from(dsn.clone()),
            });
        }

        let read = |id: &str| -> Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .ok_or_else(|| anyhow!("missing required argument: --{id}"))
        };

        let port = matches
            .get_one::<u16>(ARG_DB_PORT)
            .copied()
            .context("missing required argument: --db-port")?;
        let password = SecretString::from(read(ARG_DB_PASSWORD)?);

        Ok(Self {
            dsn: build_dsn(
                &read(ARG_DB_HOST)?,
                port,
                &read(ARG_DB_NAME)?,
                &read(ARG_DB_USER)?,
                &password,
            )?,
        })
    }
}

fn build_dsn(
    host: &str,
    port: u16,
    name: &str,
    user: &str,
    password: &SecretString,
) -> Result<SecretString> {
    let mut dsn = Url::parse(&format!("postgres://{host}"))
        .with_context(|| format!("Invalid database host: {host}"))?;

    dsn.set_port(Some(port))
        .map_err(|()| anyhow!("Error setting port"))?;

    dsn.set_username(user)
        .map_err(|()| anyhow!("Error setting username"))?;

    dsn.set_password(Some(password.expose_secret()))
        .map_err(|()| anyhow!("Error setting password"))?;

    dsn.set_path(name);

    Ok(SecretString::from(dsn.to_string()))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Database connection string, overrides the discrete --db-* settings")
                .env("LOGINGUARD_DSN"),
        )
        .arg(
            Arg::new(ARG_DB_HOST)
                .long(ARG_DB_HOST)
                .help("Database host")
                .env("DB_HOST")
                .default_value("localhost"),
        )
        .arg(
            Arg::new(ARG_DB_PORT)
                .long(ARG_DB_PORT)
                .help("Database port")
                .env("DB_PORT")
                .default_value("5432")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DB_NAME)
                .long(ARG_DB_NAME)
                .help("Database name")
                .env("DB_NAME")
                .default_value("login_db"),
        )
        .arg(
            Arg::new(ARG_DB_USER)
                .long(ARG_DB_USER)
                .help("Database user")
                .env("DB_USER")
                .default_value("postgres"),
        )
        .arg(
            Arg::new(ARG_DB_PASSWORD)
                .long(ARG_DB_PASSWORD)
                .help("Database password")
                .env("DB_PASSWORD")
                .hide_env_values(true)
                .default_value("postgres"),
        )
}
