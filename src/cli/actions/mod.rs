pub mod login;
pub mod logout;
pub mod session;

use crate::auth::types::Role;
use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Login {
        identifier: String,
        secret: SecretString,
        role: Role,
        wait: bool,
    },
    Logout,
    Session,
}
