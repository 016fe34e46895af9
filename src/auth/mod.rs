//! Credential submission, lockout, and session state.
//!
//! Flow Overview:
//! 1) A submission first consults the [`policy::LockoutPolicy`] against the
//!    identifier's persisted [`policy::AttemptRecord`].
//! 2) If allowed, the credentials are sent to the backend verification
//!    endpoint; the backend is the authoritative identity provider.
//! 3) Success resets the attempt record and populates the [`session::SessionStore`];
//!    an explicit rejection is counted and may impose an exponential lockout.
//! 4) While a lockout is active the [`countdown::CountdownController`] ticks
//!    once per second so the console can display the remaining time; the
//!    persisted `locked_until` stays the source of truth.
//!
//! ## Lockout
//!
//! - **Attempt Limit:** 5 consecutive failures per identifier (configurable).
//! - **Backoff:** 1, 2, 4, 8 … minutes for the 1st, 2nd, 3rd, 4th lockout cycle.
//! - Records are independent per identifier; there is no cross-account throttling.
//!
//! > **Warning:** the attempt records live on the client. Clearing local
//! > state or switching machines bypasses the lockout entirely, so this is a
//! > UX throttle against casual guessing, not a security boundary. The
//! > backend must enforce its own abuse protection.

pub mod attempts;
pub mod config;
pub mod countdown;
pub mod flow;
pub mod gate;
pub mod policy;
pub mod session;
pub mod types;

pub use attempts::AttemptStore;
pub use config::GuardConfig;
pub use countdown::{CountdownController, CountdownState};
pub use flow::{CredentialFlow, LoginError};
pub use gate::{authorize, GateDecision};
pub use policy::{AttemptRecord, Evaluation, FailureOutcome, LockoutPolicy};
pub use session::{Session, SessionStore};
pub use types::{Role, UserProfile};
