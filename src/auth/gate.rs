//! Role gate for restricted views.
//!
//! Pure and stateless: callers evaluate it on every render against the
//! current session. Nothing here reads or writes attempt records.

use crate::auth::session::Session;
use crate::auth::types::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Render the requested view.
    Permit,
    /// Send the viewer to the anonymous login view.
    RedirectToLogin,
}

/// Permit iff a session exists and its role is in the required set.
#[must_use]
pub fn authorize(session: Option<&Session>, required_roles: &[Role]) -> GateDecision {
    match session {
        Some(session) if required_roles.contains(&session.user.role) => GateDecision::Permit,
        _ => GateDecision::RedirectToLogin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::UserProfile;

    fn session_with_role(role: Role) -> Session {
        Session {
            user: UserProfile {
                id: "u-1".to_string(),
                display_name: "Lin".to_string(),
                role,
                contact_email: None,
                contact_phone: None,
            },
            token: None,
        }
    }

    #[test]
    fn anonymous_viewers_are_redirected() {
        assert_eq!(
            authorize(None, &[Role::Student]),
            GateDecision::RedirectToLogin
        );
    }

    #[test]
    fn matching_role_is_permitted() {
        let session = session_with_role(Role::Teacher);
        assert_eq!(
            authorize(Some(&session), &[Role::Teacher, Role::Admin]),
            GateDecision::Permit
        );
    }

    #[test]
    fn non_matching_role_is_redirected() {
        let session = session_with_role(Role::Company);
        assert_eq!(
            authorize(Some(&session), &[Role::Admin]),
            GateDecision::RedirectToLogin
        );
    }

    #[test]
    fn empty_required_set_permits_nobody() {
        let session = session_with_role(Role::Admin);
        assert_eq!(
            authorize(Some(&session), &[]),
            GateDecision::RedirectToLogin
        );
    }
}
