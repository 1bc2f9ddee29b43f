//! Crossing detection logic
//!
//! Determines when a bid and ask can match based on rate compatibility

use types::numeric::Rate;
use types::order::Side;

/// A bid and an ask cross when the bid rate is at least the ask rate
pub fn can_match(bid_rate: Rate, ask_rate: Rate) -> bool {
    bid_rate >= ask_rate
}

/// Check if an incoming order crosses a resting order on the opposite side
pub fn incoming_can_match(incoming_side: Side, incoming_rate: Rate, resting_rate: Rate) -> bool {
    match incoming_side {
        Side::BUY => can_match(incoming_rate, resting_rate),
        Side::SELL => can_match(resting_rate, incoming_rate),
    }
}
