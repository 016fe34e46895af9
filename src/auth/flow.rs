//! Credential submission against the backend verification endpoints.
//!
//! Flow Overview:
//! 1) Trim and validate input; the privileged path also enforces the admin
//!    naming convention before anything is counted or sent.
//! 2) Consult the lockout policy; a locked identifier is refused with the
//!    remaining seconds and no network call is made.
//! 3) POST the credentials. An explicit rejection is counted against the
//!    identifier; a transport failure or uninterpretable response is
//!    surfaced separately and never advances the counter.
//! 4) Success resets the attempt record and populates the session store.
//!
//! Nothing is retried silently, and only one submission may be in flight.

use anyhow::{Context, Result};
use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::auth::attempts::AttemptStore;
use crate::auth::config::GuardConfig;
use crate::auth::policy::{Evaluation, FailureOutcome, LockoutPolicy};
use crate::auth::session::SessionStore;
use crate::auth::types::{Role, UserProfile, VerifyRequest, VerifyResponse};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const LOGIN_PATH: &str = "/v1/auth/login";
const ADMIN_LOGIN_PATH: &str = "/v1/auth/admin/login";

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// Malformed input, rejected locally before the counter or the network.
    #[error("{0}")]
    Validation(String),
    /// The identifier is locked out; no network call was made.
    #[error("Too many failed attempts, retry in {seconds_remaining}s")]
    Locked { seconds_remaining: u64 },
    /// The backend explicitly rejected the credentials.
    #[error("{message}")]
    Rejected {
        message: String,
        /// Attempts left before the next lockout, when no lock was imposed.
        attempts_remaining: Option<u32>,
        /// Duration of the lockout this failure just triggered.
        locked_for: Option<Duration>,
    },
    /// No usable response from the backend; not counted as a failure.
    #[error("Cannot reach the verification service")]
    Unreachable(#[source] reqwest::Error),
    /// The backend replied but the payload failed the shape check; also
    /// not counted as a failure.
    #[error("Unexpected response from the verification service")]
    Malformed,
    /// A submission for this flow is already outstanding.
    #[error("A submission is already in progress")]
    Pending,
}

pub struct CredentialFlow {
    client: Client,
    login_url: Url,
    admin_login_url: Url,
    policy: LockoutPolicy,
    admin_identifier: Regex,
    attempts: Arc<AttemptStore>,
    session: Arc<SessionStore>,
    in_flight: AtomicBool,
}

impl CredentialFlow {
    pub fn new(
        config: &GuardConfig,
        api_url: &Url,
        attempts: Arc<AttemptStore>,
        session: Arc<SessionStore>,
    ) -> Result<Self> {
        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;
        let admin_identifier = Regex::new(config.admin_identifier_pattern())
            .context("invalid admin identifier pattern")?;
        Ok(Self {
            client,
            login_url: api_url.join(LOGIN_PATH).context("invalid API URL")?,
            admin_login_url: api_url.join(ADMIN_LOGIN_PATH).context("invalid API URL")?,
            policy: config.policy(),
            admin_identifier,
            attempts,
            session,
            in_flight: AtomicBool::new(false),
        })
    }

    /// Log in on the non-privileged path with a claimed role.
    pub async fn login(
        &self,
        identifier: &str,
        secret: &SecretString,
        role: Role,
    ) -> Result<UserProfile, LoginError> {
        let identifier = identifier.trim();
        let secret = validate(identifier, secret)?;
        self.submit(&self.login_url, identifier, secret, Some(role))
            .await
    }

    /// Log in on the privileged path. The identifier must follow the admin
    /// naming convention; mismatches are refused locally without counting.
    pub async fn admin_login(
        &self,
        identifier: &str,
        secret: &SecretString,
    ) -> Result<UserProfile, LoginError> {
        let identifier = identifier.trim();
        let secret = validate(identifier, secret)?;
        if !self.admin_identifier.is_match(identifier) {
            return Err(LoginError::Validation(
                "Not an administrator account name".to_string(),
            ));
        }
        self.submit(&self.admin_login_url, identifier, secret, None)
            .await
    }

    async fn submit(
        &self,
        endpoint: &Url,
        identifier: &str,
        secret: &str,
        role: Option<Role>,
    ) -> Result<UserProfile, LoginError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(LoginError::Pending)?;

        // Policy gate before anything leaves the client.
        let now = Utc::now();
        let mut record = self.attempts.load(identifier, now);
        let evaluation = self.policy.evaluate(&mut record, now);
        self.persist(identifier, &record);
        if let Evaluation::Locked { seconds_remaining } = evaluation {
            debug!("Refusing submission for {identifier}: locked for {seconds_remaining}s");
            return Err(LoginError::Locked { seconds_remaining });
        }

        let request = VerifyRequest {
            identifier,
            secret,
            role,
        };
        let response = self
            .client
            .post(endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(LoginError::Unreachable)?;

        // The verdict lives in the body; a body that does not parse is a
        // connectivity-class failure and must not advance the counter.
        let verify: VerifyResponse = response.json().await.map_err(LoginError::Unreachable)?;

        if verify.success {
            let Some(user) = verify.user else {
                warn!("Verification response claimed success without a user");
                return Err(LoginError::Malformed);
            };
            if let Err(err) = self.attempts.reset(identifier) {
                error!("Failed to reset attempt record for {identifier}: {err}");
            }
            self.session
                .set_authenticated_user(user.clone(), verify.token);
            return Ok(user);
        }

        // Explicit rejection: count it.
        let now = Utc::now();
        let outcome = self.policy.record_failure(&mut record, now);
        self.persist(identifier, &record);

        let message = verify
            .message
            .unwrap_or_else(|| "Invalid account or password".to_string());
        match outcome {
            FailureOutcome::AttemptsRemaining(attempts_remaining) => Err(LoginError::Rejected {
                message,
                attempts_remaining: Some(attempts_remaining),
                locked_for: None,
            }),
            FailureOutcome::LockedOut { duration } => Err(LoginError::Rejected {
                message,
                attempts_remaining: None,
                locked_for: Some(duration),
            }),
        }
    }

    /// Lockout state for an identifier without submitting anything, for
    /// callers that drive the countdown display.
    #[must_use]
    pub fn evaluate(&self, identifier: &str) -> Evaluation {
        let now = Utc::now();
        let mut record = self.attempts.load(identifier.trim(), now);
        let evaluation = self.policy.evaluate(&mut record, now);
        self.persist(identifier.trim(), &record);
        evaluation
    }

    #[must_use]
    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    // Persistence failures are logged, never fatal: the login form must
    // stay interactive.
    fn persist(&self, identifier: &str, record: &crate::auth::policy::AttemptRecord) {
        if let Err(err) = self.attempts.save(identifier, record) {
            error!("Failed to persist attempt record for {identifier}: {err}");
        }
    }
}

/// Check both inputs and hand back the trimmed secret, which is also what
/// goes on the wire.
fn validate<'a>(identifier: &str, secret: &'a SecretString) -> Result<&'a str, LoginError> {
    if identifier.is_empty() {
        return Err(LoginError::Validation(
            "Account name must not be empty".to_string(),
        ));
    }
    let secret = secret.expose_secret().trim();
    if secret.is_empty() {
        return Err(LoginError::Validation(
            "Password must not be empty".to_string(),
        ));
    }
    Ok(secret)
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
