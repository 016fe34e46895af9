//! Guard configuration with defaults and builder-style overrides.

use std::time::Duration;

use crate::auth::policy::LockoutPolicy;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_BASE_LOCK: Duration = Duration::from_millis(60_000);
const DEFAULT_ATTEMPT_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);
// Privileged accounts follow the `admin<suffix>` naming convention; anything
// else is rejected before the attempt counter or the network is touched.
const DEFAULT_ADMIN_IDENTIFIER_PATTERN: &str = "^admin[0-9A-Za-z]*$";

#[derive(Clone, Debug)]
pub struct GuardConfig {
    max_attempts: u32,
    base_lock: Duration,
    attempt_retention: Duration,
    admin_identifier_pattern: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GuardConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_lock: DEFAULT_BASE_LOCK,
            attempt_retention: DEFAULT_ATTEMPT_RETENTION,
            admin_identifier_pattern: DEFAULT_ADMIN_IDENTIFIER_PATTERN.to_string(),
        }
    }

    /// Failures allowed per cycle before a lockout is imposed.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Duration of the first lockout; later cycles double it.
    #[must_use]
    pub fn with_base_lock(mut self, base_lock: Duration) -> Self {
        self.base_lock = base_lock;
        self
    }

    /// Attempt records idle longer than this are dropped on load.
    #[must_use]
    pub fn with_attempt_retention(mut self, retention: Duration) -> Self {
        self.attempt_retention = retention;
        self
    }

    #[must_use]
    pub fn with_admin_identifier_pattern(mut self, pattern: String) -> Self {
        self.admin_identifier_pattern = pattern;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn base_lock(&self) -> Duration {
        self.base_lock
    }

    #[must_use]
    pub fn attempt_retention(&self) -> Duration {
        self.attempt_retention
    }

    #[must_use]
    pub fn admin_identifier_pattern(&self) -> &str {
        &self.admin_identifier_pattern
    }

    #[must_use]
    pub fn policy(&self) -> LockoutPolicy {
        LockoutPolicy::new(self.max_attempts, self.base_lock)
    }
}
