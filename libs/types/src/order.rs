//! Order lifecycle types
//!
//! An order escrows the currency it offers: a buy order holds `EOS`, a sell
//! order holds `RAM`. `remaining` is the part of that escrow not yet traded.

use crate::errors::OrderError;
use crate::ids::{AccountName, OrderId, TxId};
use crate::numeric::{Asset, Currency, Rate};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid), offers the base currency
    BUY,
    /// Sell order (ask), offers the synthetic token
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }

    /// Currency escrowed by orders on this side
    pub fn offered_currency(&self) -> Currency {
        match self {
            Side::BUY => Currency::Base,
            Side::SELL => Currency::Synthetic,
        }
    }

    /// Side opened by a deposit of `currency`
    pub fn for_currency(currency: Currency) -> Self {
        match currency {
            Currency::Base => Side::BUY,
            Currency::Synthetic => Side::SELL,
        }
    }
}

/// Ledger time in whole seconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Expiration value meaning "never expires"
    pub const NEVER: Timestamp = Timestamp(0);

    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    pub fn checked_add_secs(&self, secs: u32) -> Option<Self> {
        self.0.checked_add(i64::from(secs)).map(Self)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::from_timestamp(self.0, 0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            None => write!(f, "{}s", self.0),
        }
    }
}

/// Time-to-live of a resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "secs")]
pub enum Ttl {
    /// Rests until filled or cancelled
    #[default]
    Infinite,
    /// Expires this many seconds after creation
    Seconds(u32),
}

impl Ttl {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Ttl::Infinite)
    }

    /// Expiration time for an order created at `now`; `Timestamp::NEVER` when infinite
    pub fn expiration_from(&self, now: Timestamp) -> Option<Timestamp> {
        match self {
            Ttl::Infinite => Some(Timestamp::NEVER),
            Ttl::Seconds(secs) => now.checked_add_secs(*secs),
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason")]
pub enum OrderStatus {
    #[serde(rename = "OPEN")]
    Open,

    #[serde(rename = "PARTIAL")]
    PartiallyFilled,

    /// Completely traded (terminal)
    #[serde(rename = "FILLED")]
    Filled,

    /// Cancelled by owner, admin or clearing (terminal)
    #[serde(rename = "CANCELED")]
    Canceled(CancelReason),

    /// TTL deadline reached (terminal)
    #[serde(rename = "EXPIRED")]
    Expired,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled(_) | OrderStatus::Expired
        )
    }
}

/// Cancel reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    OwnerRequested,
    AdminCancel,
    Cleared,
}

/// Complete order structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    /// Transaction that created the order
    pub tx_id: TxId,
    pub trader: AccountName,
    pub side: Side,
    pub rate: Rate,
    /// Amount escrowed at creation
    pub quantity: Asset,
    pub remaining: Asset,
    pub status: OrderStatus,
    pub created_at: Timestamp,
    /// `Timestamp::NEVER` when the order has no TTL
    pub expires_at: Timestamp,
    /// Arrival sequence assigned by the engine, last tie-break after `created_at`
    pub sequence: u64,
}

impl Order {
    /// Create a new open order escrowing `quantity`
    pub fn new(
        tx_id: TxId,
        trader: AccountName,
        side: Side,
        rate: Rate,
        quantity: Asset,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            order_id: OrderId::derive(&tx_id),
            tx_id,
            trader,
            side,
            rate,
            quantity,
            remaining: quantity,
            status: OrderStatus::Open,
            created_at,
            expires_at,
            sequence: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn has_fills(&self) -> bool {
        self.remaining != self.quantity
    }

    pub fn has_ttl(&self) -> bool {
        self.expires_at != Timestamp::NEVER
    }

    /// True once `now` has reached a finite expiration time
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.has_ttl() && now >= self.expires_at
    }

    /// Synthetic units the remaining escrow is worth at the order's own rate
    ///
    /// `None` when a buy order's conversion overflows.
    pub fn tradable_synthetic(&self) -> Option<rust_decimal::Decimal> {
        match self.side {
            Side::SELL => Some(self.remaining.amount),
            Side::BUY => self.rate.synthetic_for(self.remaining.amount),
        }
    }

    /// An order is exhausted when nothing is left, or when a buy order's
    /// remaining escrow cannot purchase a single unit at its own rate.
    ///
    /// `None` when the buy-side conversion overflows.
    pub fn is_exhausted(&self) -> Option<bool> {
        if self.remaining.is_zero() {
            return Some(true);
        }
        self.tradable_synthetic().map(|units| units.is_zero())
    }

    /// Deduct a traded amount from `remaining` and update status
    pub fn add_fill(&mut self, traded: Asset) -> Result<(), OrderError> {
        if !self.is_open() {
            return Err(OrderError::AlreadyTerminal {
                order_id: self.order_id,
            });
        }
        let remaining = self
            .remaining
            .checked_sub(&traded)
            .ok_or(OrderError::Overfill {
                order_id: self.order_id,
                remaining: self.remaining,
                requested: traded,
            })?;

        self.remaining = remaining;
        self.status = if remaining.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        Ok(())
    }

    /// Close an exhausted order, returning the dust left in escrow (possibly zero)
    pub fn close_filled(&mut self) -> Asset {
        let dust = self.remaining;
        self.remaining = Asset::zero(self.remaining.currency);
        self.status = OrderStatus::Filled;
        dust
    }

    /// Cancel the order, returning the escrow to refund
    pub fn cancel(&mut self, reason: CancelReason) -> Result<Asset, OrderError> {
        self.terminate(OrderStatus::Canceled(reason))
    }

    /// Expire the order, returning the escrow to refund
    pub fn expire(&mut self) -> Result<Asset, OrderError> {
        self.terminate(OrderStatus::Expired)
    }

    fn terminate(&mut self, status: OrderStatus) -> Result<Asset, OrderError> {
        if !self.is_open() {
            return Err(OrderError::AlreadyTerminal {
                order_id: self.order_id,
            });
        }
        let refund = self.remaining;
        self.remaining = Asset::zero(refund.currency);
        self.status = status;
        Ok(refund)
    }
}
