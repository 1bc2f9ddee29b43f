//! Types library for the synthetic resource exchange
//!
//! This library provides the core type definitions shared by the matching engine
//! and the exchange contract, with deterministic arithmetic throughout.
//!
//! # Modules
//! - `ids`: Identifiers (OrderId, TxId, AccountName) and order id derivation
//! - `numeric`: Currencies, fixed-point assets and exchange rates
//! - `order`: Order lifecycle types
//! - `trade`: Trade results produced by matching
//! - `fee`: Fee schedule and fee deduction
//! - `errors`: Order error taxonomy

pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;
pub mod fee;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
    pub use crate::fee::*;
    pub use crate::errors::*;
}
