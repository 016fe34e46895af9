use crate::auth::types::Role;
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};
use std::path::PathBuf;

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn validator_role() -> ValueParser {
    ValueParser::from(
        move |role: &str| -> std::result::Result<Role, String> { role.parse() },
    )
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("custodia")
        .about("Login guard for the internship administration console")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg(
            Arg::new("api-url")
                .short('u')
                .long("api-url")
                .help("Base URL of the backend verification service")
                .default_value("http://127.0.0.1:8080")
                .env("CUSTODIA_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("state-dir")
                .long("state-dir")
                .help("Directory for the session and attempt records")
                .env("CUSTODIA_STATE_DIR")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("CUSTODIA_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("login")
                .about("Authenticate against the backend and store the session")
                .arg(
                    Arg::new("identifier")
                        .help("Account name, e.g. stu042 or admin001")
                        .required(true),
                )
                .arg(
                    Arg::new("secret")
                        .short('s')
                        .long("secret")
                        .help("Account password")
                        .env("CUSTODIA_SECRET")
                        .required(true),
                )
                .arg(
                    Arg::new("role")
                        .short('r')
                        .long("role")
                        .help("Claimed role: student, teacher, company or admin")
                        .default_value("student")
                        .value_parser(validator_role()),
                )
                .arg(
                    Arg::new("wait")
                        .short('w')
                        .long("wait")
                        .help("If locked out, wait for the lock to expire and retry once")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("logout").about("Clear the stored session"))
        .subcommand(Command::new("session").about("Show the stored session and view access"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "custodia");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Login guard for the internship administration console"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_login_args() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "custodia",
            "--api-url",
            "http://backend.example.edu",
            "login",
            "admin001",
            "--secret",
            "hunter2",
            "--role",
            "admin",
        ]);

        assert_eq!(
            matches.get_one::<String>("api-url").map(String::as_str),
            Some("http://backend.example.edu")
        );
        let (name, sub) = matches.subcommand().expect("subcommand");
        assert_eq!(name, "login");
        assert_eq!(
            sub.get_one::<String>("identifier").map(String::as_str),
            Some("admin001")
        );
        assert_eq!(sub.get_one::<Role>("role").copied(), Some(Role::Admin));
        assert!(!sub.get_flag("wait"));
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("CUSTODIA_API_URL", Some("http://api.example.edu")),
                ("CUSTODIA_SECRET", Some("hunter2")),
                ("CUSTODIA_STATE_DIR", Some("/tmp/custodia-state")),
                ("CUSTODIA_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["custodia", "login", "stu042"]);
                assert_eq!(
                    matches.get_one::<String>("api-url").map(String::as_str),
                    Some("http://api.example.edu")
                );
                assert_eq!(
                    matches.get_one::<PathBuf>("state-dir").cloned(),
                    Some(PathBuf::from("/tmp/custodia-state"))
                );
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));
                let (_, sub) = matches.subcommand().expect("subcommand");
                assert_eq!(
                    sub.get_one::<String>("secret").map(String::as_str),
                    Some("hunter2")
                );
                assert_eq!(sub.get_one::<Role>("role").copied(), Some(Role::Student));
            },
        );
    }

    #[test]
    fn test_invalid_role_is_rejected() {
        let command = new();
        let result = command.try_get_matches_from(vec![
            "custodia", "login", "stu042", "--secret", "pw", "--role", "registrar",
        ]);
        assert!(result.is_err());
    }
}
