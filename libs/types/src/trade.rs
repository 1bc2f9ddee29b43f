//! Trade results produced by the matching engine
//!
//! A `TradeResult` is ephemeral: it is produced by a single match and consumed
//! by settlement within the same operation. It is never stored in the book.

use crate::ids::{AccountName, OrderId};
use crate::numeric::{Asset, Rate};
use crate::order::{Side, Timestamp};
use serde::{Deserialize, Serialize};

/// Outcome of one match between a buy order and a sell order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    /// Monotonic trade sequence assigned by the executor
    pub sequence: u64,

    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer: AccountName,
    pub seller: AccountName,

    /// Side of the incoming (taker) order
    pub taker_side: Side,
    /// Execution rate (the resting order's rate)
    pub rate: Rate,

    /// Synthetic units leaving the sell order's escrow
    pub synthetic: Asset,
    /// Base currency leaving the buy order's escrow
    pub base: Asset,

    /// Fee withheld from the synthetic units delivered to the buyer
    pub buyer_fee: Asset,
    /// Fee withheld from the base currency delivered to the seller
    pub seller_fee: Asset,

    pub executed_at: Timestamp,
}

impl TradeResult {
    pub fn maker_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::BUY => self.sell_order_id,
            Side::SELL => self.buy_order_id,
        }
    }

    pub fn taker_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::BUY => self.buy_order_id,
            Side::SELL => self.sell_order_id,
        }
    }

    /// Synthetic units credited to the buyer after fees
    pub fn buyer_receives(&self) -> Asset {
        self.synthetic
            .checked_sub(&self.buyer_fee)
            .unwrap_or_else(|| Asset::zero(self.synthetic.currency))
    }

    /// Base currency credited to the seller after fees
    pub fn seller_receives(&self) -> Asset {
        self.base
            .checked_sub(&self.seller_fee)
            .unwrap_or_else(|| Asset::zero(self.base.currency))
    }

    /// Fees never exceed the amounts they are taken from
    pub fn check_fee_bounds(&self) -> bool {
        !self.buyer_fee.amount.is_sign_negative()
            && !self.seller_fee.amount.is_sign_negative()
            && self.buyer_fee.amount <= self.synthetic.amount
            && self.seller_fee.amount <= self.base.amount
    }
}
