pub mod database;
pub mod logging;
pub mod protection;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_PORT: &str = "port";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("loginguard")
        .about("Login service with account suspension and IP blocking")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("5000")
                .env("PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    let command = database::with_args(command);
    let command = protection::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protection::{
        ARG_CORS_ALLOW_ORIGIN, ARG_IP_THRESHOLD, ARG_LOGIN_REQUESTS_PER_MINUTE,
        ARG_SUSPENSION_MINUTES, ARG_TRUST_FORWARDED_FOR, ARG_USER_THRESHOLD,
    };

    /// Every env var the command reads, so ambient values cannot leak in.
    const ENV_VARS: [&str; 18] = [
        "PORT",
        "LOGINGUARD_DSN",
        "DB_HOST",
        "DB_PORT",
        "DB_NAME",
        "DB_USER",
        "DB_PASSWORD",
        "LOGINGUARD_USER_THRESHOLD",
        "LOGINGUARD_USER_WINDOW_MINUTES",
        "LOGINGUARD_SUSPENSION_MINUTES",
        "LOGINGUARD_IP_THRESHOLD",
        "LOGINGUARD_IP_WINDOW_MINUTES",
        "LOGINGUARD_TRUST_FORWARDED_FOR",
        "LOGINGUARD_LOGIN_REQUESTS_PER_MINUTE",
        "LOGINGUARD_DEFAULT_REQUESTS_PER_MINUTE",
        "LOGINGUARD_PRUNE_INTERVAL_SECONDS",
        "LOGINGUARD_CORS_ALLOW_ORIGIN",
        "LOGINGUARD_LOG_LEVEL",
    ];

    fn with_clean_env<F: FnOnce()>(overrides: &[(&str, &str)], test: F) {
        let vars: Vec<(&str, Option<&str>)> = ENV_VARS
            .iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| *value);
                (*name, value)
            })
            .collect();
        temp_env::with_vars(vars, test);
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "loginguard");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Login service with account suspension and IP blocking".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        with_clean_env(&[], || {
            let matches = new().get_matches_from(vec!["loginguard"]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(5000));
            assert_eq!(matches.get_one::<u32>(ARG_USER_THRESHOLD).copied(), Some(5));
            assert_eq!(
                matches.get_one::<u32>(ARG_SUSPENSION_MINUTES).copied(),
                Some(15)
            );
            assert_eq!(matches.get_one::<u32>(ARG_IP_THRESHOLD).copied(), Some(100));
            assert_eq!(
                matches
                    .get_one::<u32>(ARG_LOGIN_REQUESTS_PER_MINUTE)
                    .copied(),
                Some(5)
            );
            assert!(!matches.get_flag(ARG_TRUST_FORWARDED_FOR));
            assert_eq!(
                matches.get_one::<String>(ARG_CORS_ALLOW_ORIGIN).cloned(),
                Some("*".to_string())
            );
            assert_eq!(matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(), Some(0));
        });
    }

    #[test]
    fn test_check_args() {
        with_clean_env(&[], || {
            let matches = new().get_matches_from(vec![
                "loginguard",
                "--port",
                "8080",
                "--user-threshold",
                "3",
                "--ip-threshold",
                "50",
                "--trust-forwarded-for",
                "-vvv",
            ]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
            assert_eq!(matches.get_one::<u32>(ARG_USER_THRESHOLD).copied(), Some(3));
            assert_eq!(matches.get_one::<u32>(ARG_IP_THRESHOLD).copied(), Some(50));
            assert!(matches.get_flag(ARG_TRUST_FORWARDED_FOR));
            assert_eq!(matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(), Some(3));
        });
    }

    #[test]
    fn test_check_env() {
        with_clean_env(
            &[
                ("PORT", "443"),
                ("LOGINGUARD_USER_THRESHOLD", "7"),
                ("LOGINGUARD_CORS_ALLOW_ORIGIN", "https://app.example.com"),
                ("LOGINGUARD_LOG_LEVEL", "info"),
            ],
            || {
                let matches = new().get_matches_from(vec!["loginguard"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));
                assert_eq!(matches.get_one::<u32>(ARG_USER_THRESHOLD).copied(), Some(7));
                assert_eq!(
                    matches.get_one::<String>(ARG_CORS_ALLOW_ORIGIN).cloned(),
                    Some("https://app.example.com".to_string())
                );
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            with_clean_env(&[("LOGINGUARD_LOG_LEVEL", level)], || {
                let matches = new().get_matches_from(vec!["loginguard"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_zero_threshold_rejected() {
        with_clean_env(&[], || {
            let result = new().try_get_matches_from(vec!["loginguard", "--user-threshold", "0"]);
            assert!(result.is_err());
        });
    }
}
