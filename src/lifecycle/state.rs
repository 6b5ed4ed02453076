//! Service lifecycle state machine.
//!
//! ```text
//! NotStarted ──▶ Listening ──▶ ShuttingDown ──▶ Stopped
//!      │                                          ▲
//!      └──────────────────────────────────────────┘
//! ```
//!
//! `NotStarted → Stopped` covers startups that never got a listener.
//! `Stopped` is terminal.

use tokio::sync::watch;

/// Where the service is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    NotStarted,
    Listening,
    ShuttingDown,
    Stopped,
}

impl ServiceState {
    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: ServiceState) -> bool {
        use ServiceState::*;
        matches!(
            (self, next),
            (NotStarted, Listening)
                | (NotStarted, Stopped)
                | (Listening, ShuttingDown)
                | (ShuttingDown, Stopped)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ServiceState::Stopped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid lifecycle transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: ServiceState,
    pub to: ServiceState,
}

/// Owner of the current state; observers subscribe through a watch channel.
#[derive(Debug)]
pub struct StateCell {
    tx: watch::Sender<ServiceState>,
}

impl StateCell {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ServiceState::NotStarted);
        Self { tx }
    }

    pub fn current(&self) -> ServiceState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.tx.subscribe()
    }

    /// Move to `next`, rejecting transitions the machine does not allow.
    pub fn advance(&self, next: ServiceState) -> Result<(), InvalidTransition> {
        let mut rejected = None;
        self.tx.send_if_modified(|state| {
            if state.can_transition_to(next) {
                tracing::debug!(from = ?*state, to = ?next, "Lifecycle transition");
                *state = next;
                true
            } else {
                rejected = Some(InvalidTransition {
                    from: *state,
                    to: next,
                });
                false
            }
        });

        match rejected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
