//! TTL lifecycle manager
//!
//! Tracks the one pending expiration each TTL-bound resting order may have.
//! Only order ids are stored; an order may leave the book before its timer
//! fires, so every firing is checked against the book again.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use types::ids::OrderId;
use types::order::{Order, Timestamp};

use crate::ports::Journal;

/// How a fired expiration should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireDecision {
    /// Order gone or already terminal; nothing to do
    Ignore,
    /// Fired before the deadline; re-arm for `expires_at`
    Reschedule { fire_at: Timestamp },
    /// Deadline reached; expire and refund
    Expire,
}

/// Pending expirations keyed by order id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlManager {
    pending: BTreeMap<OrderId, Timestamp>,
}

impl TtlManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the expiration of a resting order. Any earlier entry is replaced.
    pub fn schedule(&mut self, order_id: OrderId, fire_at: Timestamp, journal: &mut Journal) {
        if self.pending.insert(order_id, fire_at).is_some() {
            journal.cancel_schedule(order_id);
        }
        journal.schedule(order_id, fire_at);
        debug!(order_id = %order_id, fire_at = %fire_at, "expiration scheduled");
    }

    /// Drop a pending expiration, if any, and cancel it best-effort
    pub fn cancel(&mut self, order_id: &OrderId, journal: &mut Journal) {
        if self.pending.remove(order_id).is_some() {
            journal.cancel_schedule(*order_id);
        }
    }

    /// Consume the pending entry for a fired timer and decide what to do
    pub fn on_fire(&mut self, order_id: &OrderId, order: Option<&Order>, now: Timestamp) -> FireDecision {
        self.pending.remove(order_id);
        match order {
            Some(order) if order.is_open() && order.has_ttl() => {
                if now < order.expires_at {
                    FireDecision::Reschedule {
                        fire_at: order.expires_at,
                    }
                } else {
                    FireDecision::Expire
                }
            }
            _ => FireDecision::Ignore,
        }
    }

    pub fn pending(&self, order_id: &OrderId) -> Option<Timestamp> {
        self.pending.get(order_id).copied()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
