//! Contract-specific error types
//!
//! Error taxonomy for exchange actions, order validation, the price oracle,
//! settings loading and the host ledger.

use matching_engine::EngineError;
use thiserror::Error;
use types::errors::OrderError;
use types::ids::{AccountName, OrderId};
use types::numeric::{Asset, Currency};

/// Rejections raised while validating an incoming order request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Wrong currency: expected {expected}, got {actual}")]
    WrongCurrency { expected: Currency, actual: Currency },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Asset },

    #[error("Amount {amount} is below the minimum trade amount {minimum}")]
    BelowMinimum { amount: Asset, minimum: Asset },

    #[error("Invalid TTL: {ttl_secs}s is below the minimum of {min_ttl_secs}s")]
    InvalidTtl { ttl_secs: u32, min_ttl_secs: u32 },

    #[error("TTL overflows the ledger clock")]
    TtlOverflow,

    #[error("Invalid rate: must be strictly positive")]
    InvalidRate,
}

/// Price oracle errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Market reserves unavailable")]
    Unavailable,

    #[error("Invalid market reserves: {base} / {synthetic}")]
    InvalidReserves { base: Asset, synthetic: Asset },

    #[error("Arithmetic overflow while pricing")]
    Overflow,
}

/// Settings loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse exchange settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid exchange settings: {0}")]
    Invalid(String),
}

/// Errors raised by the host ledger while applying a receipt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient balance for {account}: required {required}")]
    InsufficientBalance { account: AccountName, required: Asset },

    #[error("Insufficient custody: required {required}")]
    InsufficientCustody { required: Asset },
}

/// Top-level exchange errors. Any error aborts the whole action.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unauthorized: {account} may not perform this action")]
    Unauthorized { account: AccountName },

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Exchange is stopped")]
    Paused,

    #[error("Exchange is not initialized")]
    NotInitialized,

    #[error("Exchange is already initialized")]
    AlreadyInitialized,

    #[error("Matching failed: {0}")]
    Match(EngineError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Arithmetic overflow in exchange accounting")]
    Overflow,
}

impl From<EngineError> for ExchangeError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Order(order) => ExchangeError::Order(order),
            other => ExchangeError::Match(other),
        }
    }
}

impl ExchangeError {
    pub fn order_not_found(order_id: OrderId) -> Self {
        ExchangeError::Order(OrderError::NotFound { order_id })
    }
}
