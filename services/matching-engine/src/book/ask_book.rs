//! Ask (sell-side) order book
//!
//! Sell orders sorted by rate ascending (best ask first), then by arrival.

use types::numeric::Rate;
use types::order::Side;

use super::order_book::{OrderBook, Priority};

/// Lowest rate first
#[derive(Debug, Clone, Copy, Default)]
pub struct AskPriority;

impl Priority for AskPriority {
    type Rank = Rate;

    const SIDE: Side = Side::SELL;

    fn rank(rate: Rate) -> Self::Rank {
        rate
    }

    fn rate(rank: Self::Rank) -> Rate {
        rank
    }
}

/// Ask (sell) side order book
pub type AskBook = OrderBook<AskPriority>;
