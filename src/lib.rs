//! Custodia — login guard and session client for the internship
//! administration console.
//!
//! The console talks to an external backend that is the authoritative
//! identity provider. Custodia is the client-resident piece sitting in
//! front of it: credential submission, per-identifier brute-force lockout,
//! the authenticated session slot, and the role gate the rest of the
//! console consumes.

pub mod auth;
pub mod cli;
