//! Matching Engine Service
//!
//! Price/time priority order books and matching for the synthetic resource
//! exchange. Buy orders escrow the base currency, sell orders escrow the
//! synthetic token, and every match executes at the resting order's rate.
//!
//! **Key Invariants:**
//! - Rate priority first, then `created_at`, then arrival sequence
//! - Deterministic matching (same inputs → same outputs)
//! - A trade never moves more than either order's remaining escrow
//! - Order ids are unique across both books
//!
//! Self-trades are permitted.

pub mod book;
pub mod matching;
pub mod engine;

pub use engine::{BookDepth, ClosedOrder, Disposition, EngineError, MatchingEngine, SubmitResult};
