//! Order book reconstruction: the single-book engine and the
//! multi-instrument, multi-publisher registry.

mod order_book;
mod registry;

pub use order_book::{BookStats, OrderBook};
pub use registry::{Market, MarketStats, SourceBook};
