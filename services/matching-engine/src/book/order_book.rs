//! Generic one-sided order book
//!
//! Both sides share one implementation parameterized by a [`Priority`] policy
//! that maps a rate to a sort rank. Price levels live in a `BTreeMap` keyed by
//! rank, so iteration is deterministic and always starts at the best level.
//! Orders themselves are owned by a secondary `BTreeMap` index keyed by id.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::marker::PhantomData;
use thiserror::Error;
use types::ids::OrderId;
use types::numeric::{Asset, Rate};
use types::order::{Order, Side};

use super::price_level::PriceLevel;

/// Ordering policy for one side of the book
pub trait Priority: Debug + Clone + Default {
    /// Sort key; the smallest rank is the best level
    type Rank: Ord + Copy + Debug;

    /// Side whose orders this book holds
    const SIDE: Side;

    fn rank(rate: Rate) -> Self::Rank;

    fn rate(rank: Self::Rank) -> Rate;
}

/// Order book errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("Order id already present in book: {order_id}")]
    DuplicateOrder { order_id: OrderId },

    #[error("Order {order_id} is on the wrong side for a {expected:?} book")]
    WrongSide { order_id: OrderId, expected: Side },

    #[error("Order {order_id} is not open")]
    NotOpen { order_id: OrderId },

    #[error("Order {order_id} collides with a resting order's time priority")]
    TimePriorityCollision { order_id: OrderId },
}

/// Aggregated view of one price level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub rate: Rate,
    pub total: Asset,
    pub orders: usize,
}

/// One side of the order book
#[derive(Debug, Clone)]
pub struct OrderBook<P: Priority> {
    levels: BTreeMap<P::Rank, PriceLevel>,
    orders: BTreeMap<OrderId, Order>,
    _policy: PhantomData<P>,
}

impl<P: Priority> OrderBook<P> {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
            orders: BTreeMap::new(),
            _policy: PhantomData,
        }
    }

    pub fn side(&self) -> Side {
        P::SIDE
    }

    /// Insert an open order. An id already present is rejected, never overwritten.
    pub fn insert(&mut self, order: Order) -> Result<(), BookError> {
        let order_id = order.order_id;
        if order.side != P::SIDE {
            return Err(BookError::WrongSide {
                order_id,
                expected: P::SIDE,
            });
        }
        if !order.is_open() {
            return Err(BookError::NotOpen { order_id });
        }
        if self.orders.contains_key(&order_id) {
            return Err(BookError::DuplicateOrder { order_id });
        }

        let level = self.levels.entry(P::rank(order.rate)).or_default();
        if !level.insert(&order) {
            if level.is_empty() {
                self.levels.remove(&P::rank(order.rate));
            }
            return Err(BookError::TimePriorityCollision { order_id });
        }
        self.orders.insert(order_id, order);
        Ok(())
    }

    pub fn find(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.orders.contains_key(order_id)
    }

    /// Remove an order, dropping its price level if it becomes empty
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let order = self.orders.remove(order_id)?;
        let rank = P::rank(order.rate);
        if let Some(level) = self.levels.get_mut(&rank) {
            level.remove(&PriceLevel::time_key(&order));
            if level.is_empty() {
                self.levels.remove(&rank);
            }
        }
        Some(order)
    }

    /// Highest-priority order
    pub fn best(&self) -> Option<&Order> {
        let id = self.levels.values().next()?.front()?;
        self.orders.get(&id)
    }

    /// Mutable access to the highest-priority order.
    ///
    /// Callers may change `remaining` and `status` only. The priority fields
    /// (`rate`, `created_at`, `sequence`) index the order and must not change.
    pub(crate) fn best_mut(&mut self) -> Option<&mut Order> {
        let id = self.levels.values().next()?.front()?;
        self.orders.get_mut(&id)
    }

    /// All orders in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Order> + '_ {
        self.levels
            .values()
            .flat_map(|level| level.iter())
            .filter_map(|id| self.orders.get(id))
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Top `depth` price levels, best first
    pub fn depth_snapshot(&self, depth: usize) -> Vec<DepthLevel> {
        let currency = P::SIDE.offered_currency();
        self.levels
            .iter()
            .take(depth)
            .map(|(rank, level)| {
                let total = level
                    .iter()
                    .filter_map(|id| self.orders.get(id))
                    .fold(Asset::zero(currency), |acc, order| {
                        acc.checked_add(&order.remaining).unwrap_or(acc)
                    });
                DepthLevel {
                    rate: P::rate(*rank),
                    total,
                    orders: level.order_count(),
                }
            })
            .collect()
    }

    /// Sum of `remaining` over every resting order; `None` on overflow
    pub fn total_remaining(&self) -> Option<Asset> {
        self.orders
            .values()
            .try_fold(Asset::zero(P::SIDE.offered_currency()), |acc, order| {
                acc.checked_add(&order.remaining)
            })
    }

    /// Remove every order, returned in priority order
    pub fn drain(&mut self) -> Vec<Order> {
        let levels = std::mem::take(&mut self.levels);
        let mut orders = std::mem::take(&mut self.orders);
        levels
            .into_values()
            .flat_map(|level| level.iter().copied().collect::<Vec<_>>())
            .filter_map(|id| orders.remove(&id))
            .collect()
    }
}

impl<P: Priority> Default for OrderBook<P> {
    fn default() -> Self {
        Self::new()
    }
}
