//! Exchange Contract
//!
//! On-chain contract layer of the synthetic resource exchange: order intake
//! from deposits and direct placements, matching through the order books,
//! settlement with fees and supply balancing, TTL expiry and administration.
//!
//! # Modules
//! - `errors`: Contract-specific error types
//! - `events`: Contract events
//! - `security`: Admin access control and the running switch
//! - `config`: Mutable exchange config and static settings
//! - `ports`: Host ledger, scheduler and oracle seams plus the effect journal
//! - `price_reference`: Spot rate and minimum trade amount
//! - `ingestion`: Order requests, deposit commands and order construction
//! - `settlement`: Trade payouts, fees, refunds and supply accounting
//! - `ttl`: Pending expirations
//! - `exchange`: The contract entry points

pub mod config;
pub mod errors;
pub mod events;
pub mod exchange;
pub mod ingestion;
pub mod ports;
pub mod price_reference;
pub mod security;
pub mod settlement;
pub mod ttl;

pub use config::{ExchangeConfig, ExchangeSettings};
pub use errors::{ExchangeError, LedgerError, OracleError, ValidationError};
pub use events::ContractEvent;
pub use exchange::{ActionContext, Exchange};
pub use ingestion::{CancelTarget, DepositCommand, OrderRequest};
pub use ports::{Effect, MarketReserves, PriceOracle, Receipt, Scheduler, TokenLedger};
pub use settlement::SupplyLedger;

/// Contract ABI version, frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
