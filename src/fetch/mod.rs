//! Polite fetch engine
//!
//! This module contains the core fetching logic, including:
//! - Dispatch spacing via a shared rate gate
//! - Response caching per URL and time bucket
//! - HTTP fetching with exponential back-off and bounded retries
//! - The explicit retry state machine and failure taxonomy

mod attempt;
mod cache;
mod client;
mod engine;
mod outcome;
mod rate_gate;

pub use attempt::{AttemptState, RetryDecision, RetryMachine};
pub use cache::ResponseCache;
pub use client::{build_http_client, ACCEPT_HTML};
pub use engine::{FetchEngine, FetchStats, FetchStatsSnapshot};
pub use outcome::{FetchError, FetchOutcome, Page};
pub use rate_gate::RateGate;
