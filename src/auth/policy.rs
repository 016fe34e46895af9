//! Pure lockout decisions over per-identifier attempt records.
//!
//! Flow Overview:
//! 1) [`LockoutPolicy::evaluate`] decides whether a submission may proceed
//!    and normalizes records whose lock has expired.
//! 2) [`LockoutPolicy::record_failure`] counts a rejected attempt and, on
//!    every `max_attempts`-th failure, imposes an exponentially growing lock.
//!
//! The policy never reads the clock or touches storage; `now` is always a
//! parameter, which keeps every decision replayable in tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Doubling stops after this many cycles to keep the lock duration finite.
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Durable failure state for one login identifier.
///
/// `locked_until` and `last_attempt` are epoch milliseconds; `0` means
/// "not locked" / "never attempted".
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AttemptRecord {
    pub failure_count: u32,
    pub locked_until: i64,
    pub last_attempt: i64,
}

impl AttemptRecord {
    #[must_use]
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until > now.timestamp_millis()
    }
}

/// Outcome of a pre-submission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evaluation {
    Allowed,
    Locked { seconds_remaining: u64 },
}

/// Outcome of counting one rejected attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Attempts left in the current cycle before a lockout is imposed.
    AttemptsRemaining(u32),
    /// The failure crossed a threshold and a new lockout starts now.
    LockedOut { duration: Duration },
}

#[derive(Clone, Copy, Debug)]
pub struct LockoutPolicy {
    max_attempts: u32,
    base_lock_ms: i64,
}

impl LockoutPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_lock: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_lock_ms: i64::try_from(base_lock.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Decide whether a submission for this record may proceed.
    ///
    /// A record whose lock has expired is normalized in place (counter and
    /// lock cleared) so the next failure starts a fresh cycle. Re-evaluating
    /// an already-normalized record is a no-op.
    pub fn evaluate(&self, record: &mut AttemptRecord, now: DateTime<Utc>) -> Evaluation {
        if record.locked_until == 0 {
            return Evaluation::Allowed;
        }

        let now_ms = now.timestamp_millis();
        if record.locked_until <= now_ms {
            record.failure_count = 0;
            record.locked_until = 0;
            return Evaluation::Allowed;
        }

        let remaining_ms = record.locked_until - now_ms;
        Evaluation::Locked {
            seconds_remaining: u64::try_from(remaining_ms).unwrap_or(0).div_ceil(1000),
        }
    }

    /// Count one rejected attempt.
    ///
    /// An expired lock is normalized first, so a user who waited out a
    /// lockout counts from zero rather than from the pre-lock total.
    pub fn record_failure(&self, record: &mut AttemptRecord, now: DateTime<Utc>) -> FailureOutcome {
        let _ = self.evaluate(record, now);

        record.failure_count = record.failure_count.saturating_add(1);
        record.last_attempt = now.timestamp_millis();

        if record.failure_count % self.max_attempts == 0 {
            let violation_level = record.failure_count / self.max_attempts;
            let shift = (violation_level - 1).min(MAX_BACKOFF_SHIFT);
            let duration_ms = self.base_lock_ms.saturating_mul(1_i64 << shift);
            record.locked_until = now.timestamp_millis().saturating_add(duration_ms);
            FailureOutcome::LockedOut {
                duration: Duration::from_millis(u64::try_from(duration_ms).unwrap_or(0)),
            }
        } else {
            FailureOutcome::AttemptsRemaining(
                self.max_attempts - record.failure_count % self.max_attempts,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy() -> LockoutPolicy {
        LockoutPolicy::new(5, Duration::from_millis(60_000))
    }

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn counts_down_remaining_attempts_before_first_lock() {
        let policy = policy();
        let mut record = AttemptRecord::default();

        for expected in [4, 3, 2, 1] {
            assert_eq!(policy.evaluate(&mut record, at(1_000)), Evaluation::Allowed);
            assert_eq!(
                policy.record_failure(&mut record, at(1_000)),
                FailureOutcome::AttemptsRemaining(expected)
            );
        }
        assert_eq!(record.failure_count, 4);
        assert_eq!(record.locked_until, 0);
    }

    #[test]
    fn fifth_failure_locks_for_base_duration() {
        let policy = policy();
        let mut record = AttemptRecord::default();

        for _ in 0..4 {
            policy.record_failure(&mut record, at(0));
        }
        assert_eq!(
            policy.record_failure(&mut record, at(0)),
            FailureOutcome::LockedOut {
                duration: Duration::from_millis(60_000)
            }
        );
        assert_eq!(record.locked_until, 60_000);
        assert_eq!(
            policy.evaluate(&mut record, at(0)),
            Evaluation::Locked {
                seconds_remaining: 60
            }
        );
    }

    #[test]
    fn seconds_remaining_rounds_up_partial_seconds() {
        let policy = policy();
        let mut record = AttemptRecord {
            failure_count: 5,
            locked_until: 60_000,
            last_attempt: 0,
        };
        assert_eq!(
            policy.evaluate(&mut record, at(59_001)),
            Evaluation::Locked {
                seconds_remaining: 1
            }
        );
    }

    #[test]
    fn expired_lock_normalizes_idempotently() {
        let policy = policy();
        let mut record = AttemptRecord {
            failure_count: 5,
            locked_until: 60_000,
            last_attempt: 0,
        };

        assert_eq!(policy.evaluate(&mut record, at(60_000)), Evaluation::Allowed);
        assert_eq!(record.failure_count, 0);
        assert_eq!(record.locked_until, 0);

        // Re-evaluating the normalized record changes nothing.
        let snapshot = record.clone();
        assert_eq!(policy.evaluate(&mut record, at(61_000)), Evaluation::Allowed);
        assert_eq!(record, snapshot);
    }

    #[test]
    fn failure_after_expired_lock_starts_a_fresh_cycle() {
        let policy = policy();
        let mut record = AttemptRecord {
            failure_count: 5,
            locked_until: 60_000,
            last_attempt: 0,
        };

        assert_eq!(
            policy.record_failure(&mut record, at(120_000)),
            FailureOutcome::AttemptsRemaining(4)
        );
        assert_eq!(record.failure_count, 1);
        assert_eq!(record.locked_until, 0);
    }

    #[test]
    fn second_cycle_doubles_the_lock_duration() {
        let policy = policy();
        let mut record = AttemptRecord::default();

        for _ in 0..5 {
            policy.record_failure(&mut record, at(0));
        }
        // Stay inside the first lock window and keep failing; the tenth
        // failure belongs to the second violation level.
        for _ in 0..4 {
            policy.record_failure(&mut record, at(30_000));
        }
        assert_eq!(
            policy.record_failure(&mut record, at(30_000)),
            FailureOutcome::LockedOut {
                duration: Duration::from_millis(120_000)
            }
        );
        assert_eq!(record.locked_until, 30_000 + 120_000);
    }

    #[test]
    fn backoff_shift_is_capped() {
        let policy = LockoutPolicy::new(1, Duration::from_millis(1));
        let mut record = AttemptRecord::default();
        for _ in 0..100 {
            policy.record_failure(&mut record, at(0));
            record.locked_until = 0; // keep failing without waiting
        }
        // Every failure locks (max_attempts = 1); the duration stays finite.
        match policy.record_failure(&mut record, at(0)) {
            FailureOutcome::LockedOut { duration } => {
                assert!(duration <= Duration::from_millis(1 << MAX_BACKOFF_SHIFT));
            }
            FailureOutcome::AttemptsRemaining(_) => panic!("expected a lockout"),
        }
    }
}
