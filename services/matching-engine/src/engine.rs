//! Matching engine core
//!
//! Main coordinator for the two order books and the matching logic. The engine
//! owns every resting order; callers get back a [`SubmitResult`] describing
//! the trades to settle and every order that left the book during the call.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use types::errors::OrderError;
use types::fee::FeeSchedule;
use types::ids::OrderId;
use types::numeric::Asset;
use types::order::{Order, Side, Timestamp};
use types::trade::TradeResult;

use crate::book::{AskBook, BidBook, BookError, DepthLevel, OrderBook, Priority};
use crate::matching::{crossing, MatchError, MatchExecutor};

/// Engine errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    #[error("Book error: {0}")]
    Book(#[from] BookError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Forced order {order_id} not completely filled: {remaining} left")]
    ForcedOrderNotFilled { order_id: OrderId, remaining: Asset },

    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}

/// An order that left the book during matching, with the escrow to return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedOrder {
    pub order: Order,
    /// Escrow left in the order when it was closed (dust or full remaining)
    pub refund: Asset,
}

/// What happened to the incoming order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Disposition {
    /// Completely filled; `dust` is any unspendable remainder to refund
    Filled { order: Order, dust: Asset },
    /// Resting in its book with the unfilled remainder
    Resting { order: Order },
}

/// Result of submitting an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub order_id: OrderId,
    /// Trades in execution order
    pub trades: Vec<TradeResult>,
    /// Makers exhausted by this order (closed as Filled)
    pub filled_makers: Vec<ClosedOrder>,
    /// Makers found expired during traversal (closed as Expired)
    pub expired_makers: Vec<ClosedOrder>,
    pub disposition: Disposition,
}

impl SubmitResult {
    pub fn is_filled(&self) -> bool {
        matches!(self.disposition, Disposition::Filled { .. })
    }
}

/// Aggregated depth of both books
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDepth {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

#[derive(Default)]
struct MatchReport {
    trades: Vec<TradeResult>,
    filled_makers: Vec<ClosedOrder>,
    expired_makers: Vec<ClosedOrder>,
}

/// Main matching engine
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    bids: BidBook,
    asks: AskBook,
    /// Trade executor with sequence generation
    executor: MatchExecutor,
    /// Arrival sequence assigned to the next submitted order
    next_order_sequence: u64,
}

impl MatchingEngine {
    pub fn new(fees: FeeSchedule) -> Self {
        Self {
            bids: BidBook::new(),
            asks: AskBook::new(),
            executor: MatchExecutor::new(1, fees),
            next_order_sequence: 1,
        }
    }

    pub fn fees(&self) -> &FeeSchedule {
        self.executor.fees()
    }

    /// Submit an order to the matching engine
    ///
    /// The order is matched against the opposite book at the resting orders'
    /// rates. Whatever is left rests in its own book unless `force` is set, in
    /// which case an order that does not fill completely is rejected and the
    /// books are left exactly as they were.
    pub fn submit(
        &mut self,
        order: Order,
        force: bool,
        now: Timestamp,
    ) -> Result<SubmitResult, EngineError> {
        if self.contains(&order.order_id) {
            return Err(OrderError::DuplicateId {
                order_id: order.order_id,
            }
            .into());
        }
        if !order.is_open() || order.has_fills() || !order.remaining.is_positive() {
            return Err(EngineError::InvalidOrder(format!(
                "order {} is not a fresh open order",
                order.order_id
            )));
        }
        if order.remaining.currency != order.side.offered_currency() {
            return Err(EngineError::InvalidOrder(format!(
                "order {} escrows {} on the {:?} side",
                order.order_id, order.remaining.currency, order.side
            )));
        }

        if force {
            let mut trial = self.clone();
            let result = trial.run_submission(order, true, now)?;
            *self = trial;
            Ok(result)
        } else {
            self.run_submission(order, false, now)
        }
    }

    fn run_submission(
        &mut self,
        mut order: Order,
        force: bool,
        now: Timestamp,
    ) -> Result<SubmitResult, EngineError> {
        order.sequence = self.next_order_sequence;
        self.next_order_sequence += 1;

        let mut report = MatchReport::default();
        match order.side {
            Side::BUY => Self::match_against(&mut self.asks, &mut self.executor, &mut order, now, &mut report)?,
            Side::SELL => Self::match_against(&mut self.bids, &mut self.executor, &mut order, now, &mut report)?,
        }

        let order_id = order.order_id;
        let exhausted = order
            .is_exhausted()
            .ok_or(MatchError::ArithmeticOverflow)?;
        let disposition = if exhausted {
            let dust = order.close_filled();
            Disposition::Filled { order, dust }
        } else if force {
            warn!(
                order_id = %order_id,
                remaining = %order.remaining,
                "forced order not completely filled"
            );
            return Err(EngineError::ForcedOrderNotFilled {
                order_id,
                remaining: order.remaining,
            });
        } else {
            match order.side {
                Side::BUY => self.bids.insert(order.clone())?,
                Side::SELL => self.asks.insert(order.clone())?,
            }
            debug!(order_id = %order_id, remaining = %order.remaining, "order resting");
            Disposition::Resting { order }
        };

        Ok(SubmitResult {
            order_id,
            trades: report.trades,
            filled_makers: report.filled_makers,
            expired_makers: report.expired_makers,
            disposition,
        })
    }

    /// Walk the opposite book from its best order while the rates cross
    fn match_against<P: Priority>(
        book: &mut OrderBook<P>,
        executor: &mut MatchExecutor,
        incoming: &mut Order,
        now: Timestamp,
        report: &mut MatchReport,
    ) -> Result<(), EngineError> {
        while !incoming
            .is_exhausted()
            .ok_or(MatchError::ArithmeticOverflow)?
        {
            let Some(best) = book.best() else {
                break;
            };
            if !crossing::incoming_can_match(incoming.side, incoming.rate, best.rate) {
                break;
            }
            let maker_id = best.order_id;

            if best.is_expired_at(now) {
                let mut expired = book
                    .remove(&maker_id)
                    .ok_or(OrderError::NotFound { order_id: maker_id })?;
                let refund = expired.expire()?;
                debug!(order_id = %maker_id, refund = %refund, "expired maker removed during matching");
                report.expired_makers.push(ClosedOrder {
                    order: expired,
                    refund,
                });
                continue;
            }

            let maker = book
                .best_mut()
                .ok_or(OrderError::NotFound { order_id: maker_id })?;
            let trade = executor.execute_trade(incoming, maker, now)?;
            let maker_exhausted = maker
                .is_exhausted()
                .ok_or(MatchError::ArithmeticOverflow)?;
            report.trades.push(trade);

            if maker_exhausted {
                let mut filled = book
                    .remove(&maker_id)
                    .ok_or(OrderError::NotFound { order_id: maker_id })?;
                let refund = filled.close_filled();
                report.filled_makers.push(ClosedOrder {
                    order: filled,
                    refund,
                });
            }
        }
        Ok(())
    }

    /// Remove an order from whichever book holds it
    ///
    /// The order is returned unchanged; the caller decides its terminal status.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        self.bids
            .remove(order_id)
            .or_else(|| self.asks.remove(order_id))
    }

    pub fn find(&self, order_id: &OrderId) -> Option<&Order> {
        self.bids.find(order_id).or_else(|| self.asks.find(order_id))
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.bids.contains(order_id) || self.asks.contains(order_id)
    }

    /// Remove every resting order on one side, or on both when `side` is `None`
    pub fn clear(&mut self, side: Option<Side>) -> Vec<Order> {
        match side {
            Some(Side::BUY) => self.bids.drain(),
            Some(Side::SELL) => self.asks.drain(),
            None => {
                let mut orders = self.bids.drain();
                orders.extend(self.asks.drain());
                orders
            }
        }
    }

    pub fn bids(&self) -> &BidBook {
        &self.bids
    }

    pub fn asks(&self) -> &AskBook {
        &self.asks
    }

    /// Top `levels` price levels of each book
    pub fn depth(&self, levels: usize) -> BookDepth {
        BookDepth {
            bids: self.bids.depth_snapshot(levels),
            asks: self.asks.depth_snapshot(levels),
        }
    }

    /// Number of resting orders on both sides
    pub fn order_count(&self) -> usize {
        self.bids.len() + self.asks.len()
    }
}
