use crate::auth::{
    gate::{authorize, GateDecision},
    session::SessionStore,
    types::Role,
};
use crate::cli::globals::GlobalArgs;
use anyhow::Result;

// Role-gated areas of the console and who may render them.
const CONSOLE_VIEWS: &[(&str, &[Role])] = &[
    ("student dashboard", &[Role::Student]),
    ("teacher dashboard", &[Role::Teacher]),
    ("company dashboard", &[Role::Company]),
    ("administration", &[Role::Admin]),
];

/// Handle the session action
pub fn handle(globals: &GlobalArgs) -> Result<()> {
    let store = SessionStore::open(&globals.state_dir);

    let Some(session) = store.current() else {
        println!("No active session");
        return Ok(());
    };

    println!(
        "Logged in as {} ({})",
        session.user.display_name, session.user.role
    );
    if let Some(email) = &session.user.contact_email {
        println!("Contact: {email}");
    }

    for (view, required) in CONSOLE_VIEWS {
        let access = match authorize(Some(&session), required) {
            GateDecision::Permit => "permitted",
            GateDecision::RedirectToLogin => "denied",
        };
        println!("{view}: {access}");
    }

    Ok(())
}
