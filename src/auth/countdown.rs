//! Once-per-second lockout countdown for display purposes.
//!
//! The controller is Idle until a submission is refused, then Counting while
//! it publishes a decrementing `seconds_remaining` over a watch channel. On
//! reaching zero it re-evaluates the persisted record through the policy, so
//! the display can never drift away from the authoritative `locked_until`:
//! if the clock says the lock is still active the count picks up the true
//! remainder, otherwise the record is normalized and the state returns to
//! Idle. Starting a countdown for a new identifier, or dropping the
//! controller, cancels the running task so no stale tick fires.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::warn;

use crate::auth::attempts::AttemptStore;
use crate::auth::policy::{Evaluation, LockoutPolicy};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownState {
    Idle,
    Counting { seconds_remaining: u64 },
}

#[derive(Debug)]
pub struct CountdownController {
    rx: watch::Receiver<CountdownState>,
    task: Option<JoinHandle<()>>,
    identifier: Option<String>,
}

impl Default for CountdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownController {
    #[must_use]
    pub fn new() -> Self {
        let (_tx, rx) = watch::channel(CountdownState::Idle);
        Self {
            rx,
            task: None,
            identifier: None,
        }
    }

    /// Begin counting down for an identifier whose submission was refused.
    /// Any countdown for a previous identifier is cancelled first.
    pub fn start(
        &mut self,
        identifier: &str,
        seconds_remaining: u64,
        store: Arc<AttemptStore>,
        policy: LockoutPolicy,
    ) {
        self.cancel();

        let (tx, rx) = watch::channel(CountdownState::Counting { seconds_remaining });
        self.rx = rx;
        self.identifier = Some(identifier.to_string());

        let identifier = identifier.to_string();
        self.task = Some(tokio::spawn(run(
            tx,
            identifier,
            seconds_remaining,
            store,
            policy,
        )));
    }

    /// Stop ticking and return to Idle. Safe to call when already Idle.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // The aborted task can no longer publish; swap in a fresh channel so
        // `state` reports Idle instead of the last Counting tick.
        let (_tx, rx) = watch::channel(CountdownState::Idle);
        self.rx = rx;
        self.identifier = None;
    }

    #[must_use]
    pub fn state(&self) -> CountdownState {
        *self.rx.borrow()
    }

    /// Identifier currently being watched, if any.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Channel for consumers that want every tick.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.rx.clone()
    }
}

impl Drop for CountdownController {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run(
    tx: watch::Sender<CountdownState>,
    identifier: String,
    mut seconds_remaining: u64,
    store: Arc<AttemptStore>,
    policy: LockoutPolicy,
) {
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of a tokio interval completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if seconds_remaining > 1 {
            seconds_remaining -= 1;
            let _ = tx.send(CountdownState::Counting { seconds_remaining });
            continue;
        }

        // The displayed count reached zero; the persisted record decides
        // whether the lock is really over.
        let now = Utc::now();
        let mut record = store.load(&identifier, now);
        match policy.evaluate(&mut record, now) {
            Evaluation::Allowed => {
                if let Err(err) = store.save(&identifier, &record) {
                    warn!("Failed to persist normalized attempt record: {err}");
                }
                let _ = tx.send(CountdownState::Idle);
                return;
            }
            Evaluation::Locked {
                seconds_remaining: true_remaining,
            } => {
                seconds_remaining = true_remaining;
                let _ = tx.send(CountdownState::Counting { seconds_remaining });
            }
        }
    }
}
