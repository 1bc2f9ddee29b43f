//! Trade execution logic
//!
//! Sizes a single match between a taker and the best resting maker, applies
//! the fills to both orders and computes the fee on each leg.
//!
//! Trades execute at the maker's rate. The synthetic quantity is the smaller
//! of the sell order's remaining units and what the buy order's remaining base
//! currency affords (rounded down); the base cost is rounded up to the base
//! precision and never exceeds the buy order's remaining escrow.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;
use types::errors::OrderError;
use types::fee::FeeSchedule;
use types::numeric::{Asset, Rate};
use types::order::{Order, Side, Timestamp};
use types::trade::TradeResult;

/// Match execution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    /// Matched orders would exchange nothing
    #[error("Invalid match quantity")]
    InvalidQuantity,

    #[error("Taker and maker are both on the {side:?} side")]
    SideMismatch { side: Side },

    #[error("Arithmetic overflow while sizing a trade")]
    ArithmeticOverflow,

    #[error(transparent)]
    Order(#[from] OrderError),
}

/// Match executor for handling trade generation
#[derive(Debug, Clone)]
pub struct MatchExecutor {
    sequence_counter: u64,
    fees: FeeSchedule,
}

impl MatchExecutor {
    /// Create a new match executor with starting sequence number
    pub fn new(starting_sequence: u64, fees: FeeSchedule) -> Self {
        Self {
            sequence_counter: starting_sequence,
            fees,
        }
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Get next sequence number (monotonically increasing)
    fn next_sequence(&mut self) -> u64 {
        let seq = self.sequence_counter;
        self.sequence_counter += 1;
        seq
    }

    /// Synthetic units and base cost for one match at `rate`
    pub fn fill_quantities(
        rate: Rate,
        buy_remaining: Decimal,
        sell_remaining: Decimal,
    ) -> Result<(Decimal, Decimal), MatchError> {
        let affordable = rate
            .synthetic_for(buy_remaining)
            .ok_or(MatchError::ArithmeticOverflow)?;
        let mut synthetic = sell_remaining.min(affordable);

        loop {
            if synthetic <= Decimal::ZERO {
                return Err(MatchError::InvalidQuantity);
            }
            let base = rate
                .base_for(synthetic)
                .ok_or(MatchError::ArithmeticOverflow)?;
            if base <= buy_remaining {
                return Ok((synthetic, base));
            }
            // Division rounding can overshoot by one unit
            synthetic -= Decimal::ONE;
        }
    }

    /// Execute a trade between an incoming taker and a resting maker
    ///
    /// Both orders are updated in place. Neither is closed here: the caller
    /// decides what to do with an exhausted order.
    pub fn execute_trade(
        &mut self,
        taker: &mut Order,
        maker: &mut Order,
        executed_at: Timestamp,
    ) -> Result<TradeResult, MatchError> {
        if taker.side == maker.side {
            return Err(MatchError::SideMismatch { side: taker.side });
        }
        for order in [&*taker, &*maker] {
            if !order.is_open() {
                return Err(OrderError::AlreadyTerminal {
                    order_id: order.order_id,
                }
                .into());
            }
        }

        let taker_side = taker.side;
        let rate = maker.rate;
        let (buy, sell) = match taker_side {
            Side::BUY => (taker, maker),
            Side::SELL => (maker, taker),
        };

        let (synthetic, base) =
            Self::fill_quantities(rate, buy.remaining.amount, sell.remaining.amount)?;
        let synthetic = Asset::synthetic(synthetic);
        let base = Asset::base(base);

        sell.add_fill(synthetic)?;
        buy.add_fill(base)?;

        let buyer_fee = self.fees.deduct(synthetic).fee;
        let seller_fee = self.fees.deduct(base).fee;
        let sequence = self.next_sequence();

        debug!(
            sequence,
            buy_order = %buy.order_id,
            sell_order = %sell.order_id,
            rate = %rate,
            synthetic = %synthetic,
            base = %base,
            "trade executed"
        );

        Ok(TradeResult {
            sequence,
            buy_order_id: buy.order_id,
            sell_order_id: sell.order_id,
            buyer: buy.trader.clone(),
            seller: sell.trader.clone(),
            taker_side,
            rate,
            synthetic,
            base,
            buyer_fee,
            seller_fee,
            executed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{AccountName, TxId};
    use types::order::OrderStatus;

    fn order(tag: &str, trader: &str, side: Side, rate: &str, amount: Asset) -> Order {
        Order::new(
            TxId::from_raw_transaction(tag.as_bytes()),
            AccountName::from(trader),
            side,
            rate.parse::<Rate>().unwrap(),
            amount,
            Timestamp::from_secs(1_000),
            Timestamp::NEVER,
        )
    }

    #[test]
    fn test_execute_trade_at_maker_rate() {
        let mut executor = MatchExecutor::new(1000, FeeSchedule::default());
        let mut maker = order("s", "alice", Side::SELL, "0.5", Asset::synthetic(Decimal::from(2048)));
        let mut taker = order("b", "bob", Side::BUY, "0.6", Asset::base(Decimal::ONE));

        let trade = executor
            .execute_trade(&mut taker, &mut maker, Timestamp::from_secs(1_001))
            .unwrap();

        assert_eq!(trade.sequence, 1000);
        assert_eq!(trade.rate, "0.5".parse::<Rate>().unwrap());
        assert_eq!(trade.synthetic, Asset::synthetic(Decimal::from(2048)));
        assert_eq!(trade.base, Asset::base(Decimal::ONE));
        // 0.1% of 2048 = 2.048 rounds up to 3 bytes
        assert_eq!(trade.buyer_fee, Asset::synthetic(Decimal::from(3)));
        assert_eq!(trade.seller_fee, Asset::base(Decimal::new(10, 4)));
        assert_eq!(trade.buyer, AccountName::from("bob"));
        assert_eq!(trade.seller, AccountName::from("alice"));
        assert_eq!(maker.status, OrderStatus::Filled);
        assert_eq!(taker.status, OrderStatus::Filled);
    }

    #[test]
    fn test_partial_fill_leaves_buy_dust() {
        let mut executor = MatchExecutor::new(1, FeeSchedule::zero());
        let mut maker = order("s", "alice", Side::SELL, "0.5", Asset::synthetic(Decimal::from(4096)));
        let mut taker = order("b", "bob", Side::BUY, "0.5", Asset::base(Decimal::new(3, 1)));

        let trade = executor
            .execute_trade(&mut taker, &mut maker, Timestamp::from_secs(1_001))
            .unwrap();

        // floor(0.3 * 1024 / 0.5) = 614 bytes costing ceil(0.29980...) = 0.2999 EOS
        assert_eq!(trade.synthetic, Asset::synthetic(Decimal::from(614)));
        assert_eq!(trade.base, Asset::base(Decimal::new(2999, 4)));
        assert_eq!(taker.remaining, Asset::base(Decimal::new(1, 4)));
        assert_eq!(taker.is_exhausted(), Some(true));
        assert_eq!(maker.remaining, Asset::synthetic(Decimal::from(3482)));
        assert_eq!(maker.status, OrderStatus::PartiallyFilled);
    }

    #[test]
    fn test_sell_taker_fills_against_bid() {
        let mut executor = MatchExecutor::new(1, FeeSchedule::zero());
        let mut maker = order("b", "bob", Side::BUY, "1", Asset::base(Decimal::from(10)));
        let mut taker = order("s", "alice", Side::SELL, "0.8", Asset::synthetic(Decimal::from(1024)));

        let trade = executor
            .execute_trade(&mut taker, &mut maker, Timestamp::from_secs(1_001))
            .unwrap();

        assert_eq!(trade.taker_side, Side::SELL);
        assert_eq!(trade.maker_order_id(), maker.order_id);
        assert_eq!(trade.rate, "1".parse::<Rate>().unwrap());
        assert_eq!(trade.base, Asset::base(Decimal::ONE));
        assert_eq!(maker.remaining, Asset::base(Decimal::from(9)));
        assert_eq!(taker.status, OrderStatus::Filled);
    }

    #[test]
    fn test_fill_quantities_never_exceed_remaining() {
        let rate = "0.3333".parse::<Rate>().unwrap();
        let (synthetic, base) =
            MatchExecutor::fill_quantities(rate, Decimal::new(12345, 4), Decimal::from(1_000_000)).unwrap();
        assert!(base <= Decimal::new(12345, 4));
        assert!(synthetic <= Decimal::from(1_000_000));
        assert!(synthetic > Decimal::ZERO);
    }

    #[test]
    fn test_unaffordable_match_is_rejected() {
        let rate = "0.5".parse::<Rate>().unwrap();
        let result = MatchExecutor::fill_quantities(rate, Decimal::new(4, 4), Decimal::from(100));
        assert_eq!(result, Err(MatchError::InvalidQuantity));
    }

    #[test]
    fn test_same_side_rejected() {
        let mut executor = MatchExecutor::new(1, FeeSchedule::zero());
        let mut a = order("a", "alice", Side::BUY, "1", Asset::base(Decimal::ONE));
        let mut b = order("b", "bob", Side::BUY, "1", Asset::base(Decimal::ONE));

        let result = executor.execute_trade(&mut a, &mut b, Timestamp::from_secs(1));
        assert_eq!(result, Err(MatchError::SideMismatch { side: Side::BUY }));
    }

    #[test]
    fn test_sequence_monotonic() {
        let mut executor = MatchExecutor::new(1000, FeeSchedule::zero());
        let mut maker = order("s", "alice", Side::SELL, "1", Asset::synthetic(Decimal::from(4096)));
        let mut taker1 = order("b1", "bob", Side::BUY, "1", Asset::base(Decimal::ONE));
        let mut taker2 = order("b2", "carol", Side::BUY, "1", Asset::base(Decimal::ONE));

        let trade1 = executor.execute_trade(&mut taker1, &mut maker, Timestamp::from_secs(1)).unwrap();
        let trade2 = executor.execute_trade(&mut taker2, &mut maker, Timestamp::from_secs(2)).unwrap();

        assert_eq!(trade1.sequence, 1000);
        assert_eq!(trade2.sequence, 1001);
    }

    #[test]
    fn test_self_trade_allowed() {
        let mut executor = MatchExecutor::new(1, FeeSchedule::zero());
        let mut maker = order("s", "alice", Side::SELL, "1", Asset::synthetic(Decimal::from(1024)));
        let mut taker = order("b", "alice", Side::BUY, "1", Asset::base(Decimal::ONE));

        let trade = executor.execute_trade(&mut taker, &mut maker, Timestamp::from_secs(1)).unwrap();
        assert_eq!(trade.buyer, trade.seller);
    }
}
