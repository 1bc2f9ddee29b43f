//! Bid (buy-side) order book
//!
//! Buy orders sorted by rate descending (best bid first), then by arrival.

use std::cmp::Reverse;
use types::numeric::Rate;
use types::order::Side;

use super::order_book::{OrderBook, Priority};

/// Highest rate first
#[derive(Debug, Clone, Copy, Default)]
pub struct BidPriority;

impl Priority for BidPriority {
    type Rank = Reverse<Rate>;

    const SIDE: Side = Side::BUY;

    fn rank(rate: Rate) -> Self::Rank {
        Reverse(rate)
    }

    fn rate(rank: Self::Rank) -> Rate {
        rank.0
    }
}

/// Bid (buy) side order book
pub type BidBook = OrderBook<BidPriority>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::order_book::BookError;
    use rust_decimal::Decimal;
    use types::ids::{AccountName, TxId};
    use types::numeric::Asset;
    use types::order::{Order, Timestamp};

    fn create_test_order(tag: &str, rate: &str, eos: i64, created: i64) -> Order {
        Order::new(
            TxId::from_raw_transaction(tag.as_bytes()),
            AccountName::from("bob"),
            Side::BUY,
            rate.parse::<Rate>().unwrap(),
            Asset::base(Decimal::from(eos)),
            Timestamp::from_secs(created),
            Timestamp::NEVER,
        )
    }

    #[test]
    fn test_bid_book_insert() {
        let mut book = BidBook::new();
        book.insert(create_test_order("a", "0.5", 10, 1)).unwrap();

        assert_eq!(book.len(), 1);
        assert_eq!(book.level_count(), 1);
        assert!(!book.is_empty());
    }

    #[test]
    fn test_bid_book_best_bid() {
        let mut book = BidBook::new();
        book.insert(create_test_order("a", "10", 1, 1)).unwrap();
        book.insert(create_test_order("b", "12", 2, 2)).unwrap();
        book.insert(create_test_order("c", "11", 3, 3)).unwrap();

        let best = book.best().unwrap();
        assert_eq!(best.rate, "12".parse::<Rate>().unwrap());
        assert_eq!(best.remaining, Asset::base(Decimal::from(2)));
    }

    #[test]
    fn test_bid_book_time_priority() {
        let mut book = BidBook::new();
        let first = create_test_order("a", "10", 1, 5);
        let second = create_test_order("b", "10", 2, 6);
        let first_id = first.order_id;

        book.insert(second).unwrap();
        book.insert(first).unwrap();

        assert_eq!(book.level_count(), 1);
        assert_eq!(book.best().unwrap().order_id, first_id);
    }

    #[test]
    fn test_bid_book_remove() {
        let mut book = BidBook::new();
        let order = create_test_order("a", "10", 1, 1);
        let order_id = order.order_id;
        book.insert(order).unwrap();

        let removed = book.remove(&order_id).unwrap();
        assert_eq!(removed.order_id, order_id);
        assert!(book.is_empty());
        assert_eq!(book.level_count(), 0);
        assert!(book.remove(&order_id).is_none());
    }

    #[test]
    fn test_bid_book_rejects_duplicate_and_wrong_side() {
        let mut book = BidBook::new();
        let order = create_test_order("a", "10", 1, 1);
        book.insert(order.clone()).unwrap();

        let err = book.insert(order.clone()).unwrap_err();
        assert_eq!(err, BookError::DuplicateOrder { order_id: order.order_id });
        assert_eq!(book.len(), 1);

        let mut sell = create_test_order("b", "10", 1, 1);
        sell.side = Side::SELL;
        assert!(matches!(book.insert(sell), Err(BookError::WrongSide { .. })));
    }

    #[test]
    fn test_bid_book_depth_snapshot() {
        let mut book = BidBook::new();
        book.insert(create_test_order("a", "10", 1, 1)).unwrap();
        book.insert(create_test_order("b", "11", 2, 2)).unwrap();
        book.insert(create_test_order("c", "11", 3, 3)).unwrap();
        book.insert(create_test_order("d", "9", 4, 4)).unwrap();

        let depth = book.depth_snapshot(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].rate, "11".parse::<Rate>().unwrap());
        assert_eq!(depth[0].total, Asset::base(Decimal::from(5)));
        assert_eq!(depth[0].orders, 2);
        assert_eq!(depth[1].rate, "10".parse::<Rate>().unwrap());
        assert_eq!(book.total_remaining(), Some(Asset::base(Decimal::from(10))));
    }

    #[test]
    fn test_bid_book_iter_and_drain_in_priority_order() {
        let mut book = BidBook::new();
        book.insert(create_test_order("a", "10", 1, 1)).unwrap();
        book.insert(create_test_order("b", "12", 1, 2)).unwrap();
        book.insert(create_test_order("c", "11", 1, 3)).unwrap();

        let rates: Vec<_> = book.iter().map(|o| o.rate.to_string()).collect();
        assert_eq!(rates, vec!["12 EOS/KiB", "11 EOS/KiB", "10 EOS/KiB"]);

        let drained = book.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].rate, "12".parse::<Rate>().unwrap());
        assert!(book.is_empty());
        assert_eq!(book.level_count(), 0);
    }
}
