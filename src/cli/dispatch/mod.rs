use crate::auth::types::Role;
use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let api_url = matches
        .get_one::<String>("api-url")
        .map(String::to_string)
        .context("missing required argument: --api-url")?;

    let state_dir = matches
        .get_one::<PathBuf>("state-dir")
        .cloned()
        .unwrap_or_else(default_state_dir);

    let globals = GlobalArgs::new(api_url, state_dir);

    let action = match matches.subcommand() {
        Some(("login", sub)) => Action::Login {
            identifier: sub
                .get_one::<String>("identifier")
                .map(String::to_string)
                .context("missing required argument: identifier")?,
            secret: SecretString::from(
                sub.get_one::<String>("secret")
                    .map(String::to_string)
                    .context("missing required argument: --secret")?,
            ),
            role: sub
                .get_one::<Role>("role")
                .copied()
                .context("missing required argument: --role")?,
            wait: sub.get_flag("wait"),
        },
        Some(("logout", _)) => Action::Logout,
        Some(("session", _)) => Action::Session,
        _ => anyhow::bail!("missing subcommand"),
    };

    Ok((action, globals))
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .map_or_else(|| PathBuf::from(".custodia"), |dir| dir.join("custodia"))
}
