//! Price level implementation with time-priority queue
//!
//! A price level contains all orders resting at one rate. Orders are kept in
//! arrival order, keyed by `(created_at, sequence)` so that ties at the same
//! ledger second are broken by the engine-assigned sequence.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::order::{Order, Timestamp};

/// Time-priority key within a price level
pub type TimeKey = (Timestamp, u64);

/// Orders resting at a single rate, oldest first
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    queue: BTreeMap<TimeKey, OrderId>,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_key(order: &Order) -> TimeKey {
        (order.created_at, order.sequence)
    }

    /// Append an order; returns false if its time key is already taken
    pub fn insert(&mut self, order: &Order) -> bool {
        let key = Self::time_key(order);
        if self.queue.contains_key(&key) {
            return false;
        }
        self.queue.insert(key, order.order_id);
        true
    }

    /// Remove an order by its time key
    pub fn remove(&mut self, key: &TimeKey) -> Option<OrderId> {
        self.queue.remove(key)
    }

    /// Oldest order at this level
    pub fn front(&self) -> Option<OrderId> {
        self.queue.values().next().copied()
    }

    /// Order ids in time priority
    pub fn iter(&self) -> impl Iterator<Item = &OrderId> {
        self.queue.values()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.queue.len()
    }
}
