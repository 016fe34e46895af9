use crate::auth::{
    attempts::AttemptStore,
    config::GuardConfig,
    countdown::{CountdownController, CountdownState},
    flow::{CredentialFlow, LoginError},
    policy::LockoutPolicy,
    session::SessionStore,
    types::Role,
};
use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{bail, Result};
use std::sync::Arc;
use url::Url;

/// Handle the login action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let Action::Login {
        identifier,
        secret,
        role,
        wait,
    } = action
    else {
        bail!("expected a login action");
    };

    let config = GuardConfig::new();
    let attempts = Arc::new(AttemptStore::new(
        globals.state_dir.join("attempts"),
        config.attempt_retention(),
    ));
    let session = Arc::new(SessionStore::open(&globals.state_dir));
    let api_url = Url::parse(&globals.api_url)?;
    let flow = CredentialFlow::new(&config, &api_url, attempts.clone(), session)?;

    let mut retry_after_unlock = wait;
    loop {
        let result = match role {
            Role::Admin => flow.admin_login(&identifier, &secret).await,
            _ => flow.login(&identifier, &secret, role).await,
        };

        match result {
            Ok(user) => {
                println!("Logged in as {} ({})", user.display_name, user.role);
                return Ok(());
            }
            Err(LoginError::Locked { seconds_remaining }) if retry_after_unlock => {
                retry_after_unlock = false;
                wait_for_unlock(
                    &identifier,
                    seconds_remaining,
                    attempts.clone(),
                    flow.policy(),
                )
                .await;
            }
            Err(LoginError::Rejected {
                message,
                attempts_remaining,
                locked_for,
            }) => match (attempts_remaining, locked_for) {
                (Some(remaining), _) => bail!("{message} ({remaining} attempts remaining)"),
                (_, Some(duration)) => {
                    bail!("{message} (locked out for {}s)", duration.as_secs())
                }
                _ => bail!("{message}"),
            },
            Err(err) => return Err(err.into()),
        }
    }
}

/// Display the countdown until the lock expires, then return.
async fn wait_for_unlock(
    identifier: &str,
    seconds_remaining: u64,
    attempts: Arc<AttemptStore>,
    policy: LockoutPolicy,
) {
    let mut controller = CountdownController::new();
    controller.start(identifier, seconds_remaining, attempts, policy);
    eprint!("Locked out, {seconds_remaining}s remaining");

    let mut rx = controller.subscribe();
    while rx.changed().await.is_ok() {
        match *rx.borrow() {
            CountdownState::Counting { seconds_remaining } => {
                eprint!("\rLocked out, {seconds_remaining}s remaining ");
            }
            CountdownState::Idle => break,
        }
    }
    eprintln!();
}
