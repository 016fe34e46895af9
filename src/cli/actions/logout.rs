use crate::auth::session::SessionStore;
use crate::cli::globals::GlobalArgs;
use anyhow::Result;

/// Handle the logout action
pub fn handle(globals: &GlobalArgs) -> Result<()> {
    let session = SessionStore::open(&globals.state_dir);
    session.logout();
    println!("Session cleared");
    Ok(())
}
