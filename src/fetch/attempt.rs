//! Retry state machine for a single fetch
//!
//! The engine drives every network delivery through these states:
//!
//! ```text
//! Idle -> Gated -> Dispatching -> Success
//!                              -> Retryable(kind) -> BackingOff -> Gated ...
//!                              -> Terminal(kind)
//!          Gated -> Terminal(DeadlineExceeded)
//! ```
//!
//! Keeping the bookkeeping here, separate from I/O, lets attempt counts and
//! back-off delays be tested without a network.

use crate::fetch::FetchError;
use std::fmt;
use std::time::Duration;

/// Current state of a fetch's delivery loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    /// Nothing dispatched yet
    Idle,

    /// Waiting on the rate gate and dispatch jitter
    Gated,

    /// Request is in flight
    Dispatching,

    /// A 200 response was received
    Success,

    /// The last attempt failed with a retryable error
    Retryable(FetchError),

    /// Sleeping out the back-off before the next attempt
    BackingOff,

    /// No further attempts will be made
    Terminal(FetchError),
}

impl AttemptState {
    /// Returns true if the loop has finished (success or give up)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Terminal(_))
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: &AttemptState) -> bool {
        use AttemptState::*;

        matches!(
            (self, next),
            (Idle, Gated)
                | (Idle, Terminal(_))
                | (Gated, Dispatching)
                | (Gated, Terminal(_))
                | (Dispatching, Success)
                | (Dispatching, Retryable(_))
                | (Dispatching, Terminal(_))
                | (Retryable(_), BackingOff)
                | (Retryable(_), Terminal(_))
                | (BackingOff, Gated)
                | (BackingOff, Terminal(_))
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Gated => "gated",
            Self::Dispatching => "dispatching",
            Self::Success => "success",
            Self::Retryable(_) => "retryable",
            Self::BackingOff => "backing_off",
            Self::Terminal(_) => "terminal",
        }
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What the engine does after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then go back through the gate
    BackOff(Duration),

    /// Attempt budget consumed; report this error
    GiveUp(FetchError),
}

/// Tracks state, attempt count and back-off for one fetch
#[derive(Debug)]
pub struct RetryMachine {
    url: String,
    state: AttemptState,
    attempts: u32,
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryMachine {
    /// Creates a machine allowing `max_attempts` dispatches (at least one)
    pub fn new(url: &str, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            url: url.to_string(),
            state: AttemptState::Idle,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    /// Number of dispatches so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Enters the rate gate for the next attempt
    pub fn gate(&mut self) {
        self.transition(AttemptState::Gated);
    }

    /// Marks the request as dispatched and counts the attempt
    pub fn dispatch(&mut self) {
        self.transition(AttemptState::Dispatching);
        self.attempts += 1;
    }

    pub fn succeed(&mut self) {
        self.transition(AttemptState::Success);
    }

    /// Records a failed attempt and decides whether to retry
    ///
    /// The back-off after zero-based attempt `n` is `base_delay * 2^n`. When
    /// the budget is spent the terminal error is `RetriesExhausted`, carrying
    /// the failure of the last attempt.
    pub fn fail(&mut self, error: FetchError) -> RetryDecision {
        if !error.is_retryable() {
            self.transition(AttemptState::Terminal(error.clone()));
            return RetryDecision::GiveUp(error);
        }

        self.transition(AttemptState::Retryable(error.clone()));

        if self.attempts < self.max_attempts {
            self.transition(AttemptState::BackingOff);
            RetryDecision::BackOff(self.backoff_delay(self.attempts - 1))
        } else {
            let exhausted = FetchError::RetriesExhausted {
                url: self.url.clone(),
                attempts: self.attempts,
                last: Box::new(error),
            };
            self.transition(AttemptState::Terminal(exhausted.clone()));
            RetryDecision::GiveUp(exhausted)
        }
    }

    /// Stops the loop before the next attempt (overall deadline reached)
    pub fn abandon(&mut self) -> FetchError {
        let error = FetchError::DeadlineExceeded {
            url: self.url.clone(),
            attempts: self.attempts,
        };
        self.transition(AttemptState::Terminal(error.clone()));
        error
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    fn transition(&mut self, next: AttemptState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid attempt transition: {} -> {}",
            self.state,
            next
        );
        tracing::trace!("{}: {} -> {}", self.url, self.state, next);
        self.state = next;
    }
}
