//! Multi-instrument, multi-publisher book registry.
//!
//! Routes incoming events to the book for their (instrument, publisher)
//! pair, creating books lazily, and computes per-publisher and cross-source
//! aggregated best-bid-offer. Publishers per instrument are few, so they are
//! held in a sequence rather than a map; the sequence guards against
//! duplicate (instrument, publisher) pairs.

use ahash::AHashMap;

use super::order_book::OrderBook;
use crate::error::{BookError, Result};
use crate::types::{MboEvent, PriceLevel};

/// One publisher's book for an instrument.
#[derive(Debug, Clone, Default)]
pub struct SourceBook {
    pub publisher_id: u16,
    pub book: OrderBook,
}

/// Statistics for multi-book routing.
#[derive(Debug, Clone, Default)]
pub struct MarketStats {
    /// Total books created
    pub book_count: usize,

    /// Total events routed across all books
    pub events_routed: u64,
}

/// Registry of order books keyed by instrument and publisher.
///
/// # Example
/// ```
/// use mbo_depth_replay::{Action, Market, MboEvent, Side};
///
/// let mut market = Market::new();
/// let ev = MboEvent::new(1, Action::Add, Side::Bid, 100_000_000_000, 10)
///     .with_source(42, 1);
/// market.apply(&ev).unwrap();
///
/// let (bid, _) = market.bbo(42, 1).unwrap();
/// assert_eq!(bid.size, 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Market {
    books: AHashMap<u32, Vec<SourceBook>>,
    stats: MarketStats,
}

impl Market {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route an event to its (instrument, publisher) book, creating the
    /// book on first sight of the pair.
    pub fn apply(&mut self, ev: &MboEvent) -> Result<()> {
        let instrument_books = self.books.entry(ev.instrument_id).or_default();
        let pos = match instrument_books
            .iter()
            .position(|sb| sb.publisher_id == ev.publisher_id)
        {
            Some(pos) => pos,
            None => {
                log::debug!(
                    "creating book for instrument {} publisher {}",
                    ev.instrument_id,
                    ev.publisher_id
                );
                instrument_books.push(SourceBook {
                    publisher_id: ev.publisher_id,
                    book: OrderBook::new(),
                });
                self.stats.book_count += 1;
                instrument_books.len() - 1
            }
        };
        instrument_books[pos].book.apply(ev)?;
        self.stats.events_routed += 1;
        Ok(())
    }

    /// All (publisher, book) pairs for an instrument, possibly empty.
    pub fn books_for(&self, instrument_id: u32) -> &[SourceBook] {
        self.books
            .get(&instrument_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The book for an exact (instrument, publisher) pair.
    ///
    /// # Errors
    /// [`BookError::NoBookForSource`] if the pair has never been seen.
    pub fn book(&self, instrument_id: u32, publisher_id: u16) -> Result<&OrderBook> {
        self.books_for(instrument_id)
            .iter()
            .find(|sb| sb.publisher_id == publisher_id)
            .map(|sb| &sb.book)
            .ok_or(BookError::NoBookForSource {
                instrument_id,
                publisher_id,
            })
    }

    /// Best bid and offer for one publisher's book.
    pub fn bbo(&self, instrument_id: u32, publisher_id: u16) -> Result<(PriceLevel, PriceLevel)> {
        Ok(self.book(instrument_id, publisher_id)?.bbo())
    }

    /// Best bid and offer merged across all publishers for an instrument.
    ///
    /// The best price wins outright (highest bid, lowest ask); exact price
    /// ties sum sizes and order counts. Publishers with an empty side are
    /// skipped. The result is independent of publisher iteration order:
    /// ties are commutative sums and non-ties resolve by strict comparison.
    pub fn aggregated_bbo(&self, instrument_id: u32) -> (PriceLevel, PriceLevel) {
        let mut agg_bid = PriceLevel::empty();
        let mut agg_ask = PriceLevel::empty();
        for sb in self.books_for(instrument_id) {
            let (bid, ask) = sb.book.bbo();
            if !bid.is_empty() {
                if agg_bid.is_empty() || bid.price > agg_bid.price {
                    agg_bid = bid;
                } else if bid.price == agg_bid.price {
                    agg_bid.size += bid.size;
                    agg_bid.count += bid.count;
                }
            }
            if !ask.is_empty() {
                if agg_ask.is_empty() || ask.price < agg_ask.price {
                    agg_ask = ask;
                } else if ask.price == agg_ask.price {
                    agg_ask.size += ask.size;
                    agg_ask.count += ask.count;
                }
            }
        }
        (agg_bid, agg_ask)
    }

    /// Get current statistics.
    pub fn stats(&self) -> &MarketStats {
        &self.stats
    }
}
