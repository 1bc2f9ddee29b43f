//! Order book infrastructure module
//!
//! Contains price levels and the generic one-sided book with its bid and ask
//! priority policies.

pub mod price_level;
pub mod order_book;
pub mod bid_book;
pub mod ask_book;

pub use price_level::PriceLevel;
pub use order_book::{BookError, DepthLevel, OrderBook, Priority};
pub use bid_book::{BidBook, BidPriority};
pub use ask_book::{AskBook, AskPriority};
