//! Matching logic module
//!
//! Implements price-time priority crossing and trade execution

pub mod crossing;
pub mod executor;

pub use crossing::{can_match, incoming_can_match};
pub use executor::{MatchError, MatchExecutor};
