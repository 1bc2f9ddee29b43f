//! Order identity and ingestion
//!
//! Turns a deposit or a direct placement into a validated open order. The
//! order id is always derived from the current transaction id.

use serde::{Deserialize, Serialize};
use types::ids::{AccountName, OrderId, TxId};
use types::numeric::{Asset, Currency, Rate};
use types::order::{Order, Side, Timestamp, Ttl};

use crate::config::ExchangeSettings;
use crate::errors::{ExchangeError, ValidationError};
use crate::ports::PriceOracle;
use crate::price_reference;

/// What to cancel: an order id or the transaction that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelTarget {
    Order(OrderId),
    Transaction(TxId),
}

impl CancelTarget {
    pub fn order_id(&self) -> OrderId {
        match self {
            CancelTarget::Order(id) => *id,
            CancelTarget::Transaction(tx_id) => OrderId::derive(tx_id),
        }
    }
}

/// Parsed command attached to an incoming deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositCommand {
    MakeOrder {
        ttl: Ttl,
        force: bool,
        rate: Option<Rate>,
    },
    CancelOrder { target: CancelTarget },
}

impl Default for DepositCommand {
    fn default() -> Self {
        DepositCommand::MakeOrder {
            ttl: Ttl::Infinite,
            force: false,
            rate: None,
        }
    }
}

/// A request to open an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub trader: AccountName,
    /// Escrow offered; its currency selects the side
    pub amount: Asset,
    pub ttl: Ttl,
    /// Fill completely or reject
    pub force: bool,
    /// Limit rate; defaults to the spot rate
    pub rate: Option<Rate>,
}

impl OrderRequest {
    pub fn side(&self) -> Side {
        Side::for_currency(self.amount.currency)
    }
}

/// Check that the request's currency matches the side it was sent for
pub fn require_currency(amount: &Asset, expected: Currency) -> Result<(), ValidationError> {
    if amount.currency != expected {
        return Err(ValidationError::WrongCurrency {
            expected,
            actual: amount.currency,
        });
    }
    Ok(())
}

/// Validate a request and build the open order it describes
pub fn build_order<O: PriceOracle + ?Sized>(
    request: &OrderRequest,
    tx_id: TxId,
    now: Timestamp,
    settings: &ExchangeSettings,
    oracle: &O,
) -> Result<Order, ExchangeError> {
    let amount = request.amount;
    if !amount.is_positive() || !amount.is_valid() {
        return Err(ValidationError::InvalidAmount { amount }.into());
    }

    let minimum = price_reference::min_trade_amount(oracle, settings, amount.currency)?;
    if amount.amount < minimum.amount {
        return Err(ValidationError::BelowMinimum { amount, minimum }.into());
    }

    if let Ttl::Seconds(ttl_secs) = request.ttl {
        // A finite order must outlive the transaction that places it
        let min_ttl_secs = settings.min_ttl_secs.max(1);
        if ttl_secs < min_ttl_secs {
            return Err(ValidationError::InvalidTtl {
                ttl_secs,
                min_ttl_secs,
            }
            .into());
        }
    }
    let expires_at = request
        .ttl
        .expiration_from(now)
        .ok_or(ValidationError::TtlOverflow)?;

    let rate = match request.rate {
        Some(rate) => {
            // Deserialized rates bypass `Rate::try_new`
            Rate::try_new(rate.as_decimal()).ok_or(ValidationError::InvalidRate)?
        }
        None => price_reference::spot_rate(oracle)?,
    };

    Ok(Order::new(
        tx_id,
        request.trader.clone(),
        request.side(),
        rate,
        amount,
        now,
        expires_at,
    ))
}
