//! Cupid Swipe - swipe ledger and match analytics for the Cupid demo app
//!
//! This library records swipe decisions and feedback notes in SQLite, scores
//! candidate compatibility, and turns feedback into engagement analytics with
//! the help of an external reasoning service.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{CompatibilityScorer, Matchmaker};
pub use error::MatchError;
pub use models::{CompatibilityScore, Profile, ScoringWeights, SwipeDirection};
pub use services::{LedgerStore, ProfileSnapshot};
