// src/client/mod.rs

//! Player-side counterpart of the API: an HTTP client, the quiz session
//! state machine, the local identity and leaderboard lookup.

pub mod api;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod ranking;
pub mod session;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, QuizBackend};
pub use error::ClientError;
pub use identity::{
    FileIdentityStore, Identity, IdentityManager, IdentityStore, MemoryIdentityStore,
};
pub use session::{Advance, CancelHandle, Clock, QuizSession, SessionState, SystemClock};
