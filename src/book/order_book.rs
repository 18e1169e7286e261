//! Single-book MBO reconstruction engine.
//!
//! Maintains price-ordered levels and per-order identity for one
//! (instrument, publisher) pair. The engine applies order events without
//! matching: executions arrive as Trade/Fill (book-neutral) followed by
//! explicit Cancels reducing the resting size.
//!
//! # Structure
//!
//! - `BTreeMap` keeps each side's levels price-sorted; bids are read through
//!   a reverse iterator so the highest price comes first.
//! - Each level holds its orders in a `Vec` in arrival/priority order;
//!   lookup within a level is a linear scan (levels are typically shallow).
//! - A side-independent `AHashMap` maps order id to (price, side) so Cancel
//!   and Modify reach the right level without scanning the book.
//!
//! # Invariants
//!
//! Every indexed id exists in exactly one level queue on the recorded side;
//! every non-top-of-book order in a queue has an index entry; top-of-book
//! orders are never indexed (a new top-of-book Add replaces the whole side).

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::error::{BookError, Result};
use crate::types::{Action, EventFlags, LevelPair, MboEvent, Order, PriceLevel, Side, Snapshot};

/// Orders resting at one price, in arrival/priority order.
type LevelQueue = Vec<Order>;

/// One side's levels, keyed by fixed-point price.
type SideLevels = BTreeMap<i64, LevelQueue>;

/// Index payload: where an order currently rests.
#[derive(Debug, Clone, Copy)]
struct PriceAndSide {
    price: i64,
    side: Side,
}

/// Statistics for monitoring book health.
#[derive(Debug, Clone, Default)]
pub struct BookStats {
    /// Total events applied successfully
    pub events_applied: u64,

    /// Number of live indexed orders
    pub active_orders: usize,

    /// Number of price levels (bid side)
    pub bid_levels: usize,

    /// Number of price levels (ask side)
    pub ask_levels: usize,

    /// Timestamp of the last applied event (nanoseconds since epoch)
    pub last_ts_event: Option<i64>,
}

/// Order book for one (instrument, publisher) pair.
///
/// # Example
/// ```
/// use mbo_depth_replay::{Action, MboEvent, OrderBook, Side};
///
/// let mut book = OrderBook::new();
/// let ev = MboEvent::new(1001, Action::Add, Side::Bid, 100_000_000_000, 10);
/// book.apply(&ev).unwrap();
///
/// let (bid, ask) = book.bbo();
/// assert_eq!(bid.price, 100_000_000_000);
/// assert!(ask.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    bids: SideLevels,
    asks: SideLevels,
    orders_by_id: AHashMap<u64, PriceAndSide>,
    stats: BookStats,
}

/// Resolve a side to its level collection without borrowing the whole book.
fn side_levels<'a>(
    bids: &'a mut SideLevels,
    asks: &'a mut SideLevels,
    side: Side,
) -> Result<&'a mut SideLevels> {
    match side {
        Side::Bid => Ok(bids),
        Side::Ask => Ok(asks),
        Side::None => Err(BookError::InvalidSide(side.to_byte())),
    }
}

/// Aggregate a level queue into its read-only view.
///
/// Top-of-book orders contribute size but are excluded from the order count.
fn aggregate_level(price: i64, queue: &[Order]) -> PriceLevel {
    let mut level = PriceLevel {
        price,
        size: 0,
        count: 0,
    };
    for order in queue {
        level.size += order.size;
        if !order.is_tob {
            level.count += 1;
        }
    }
    level
}

impl OrderBook {
    /// Create a new empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a single MBO event, dispatching on its action.
    ///
    /// Trade and Fill are no-ops at this layer: they are expected to be
    /// followed by explicit Cancels, and the book never infers a size
    /// reduction from them alone.
    ///
    /// # Errors
    /// Protocol violations surface as the corresponding [`BookError`]; the
    /// failing event either made no mutation or is atomic per action.
    pub fn apply(&mut self, ev: &MboEvent) -> Result<()> {
        match ev.action {
            Action::Trade | Action::Fill => {}
            Action::Clear => self.clear(),
            Action::Add => self.add(
                ev.ts_event,
                ev.side,
                ev.order_id,
                ev.price,
                ev.size,
                ev.flags,
            )?,
            Action::Cancel => self.cancel(ev.side, ev.order_id, ev.price, ev.size)?,
            Action::Modify => self.modify(
                ev.ts_event,
                ev.side,
                ev.order_id,
                ev.price,
                ev.size,
                ev.flags,
            )?,
        }

        self.stats.events_applied += 1;
        self.stats.active_orders = self.orders_by_id.len();
        self.stats.bid_levels = self.bids.len();
        self.stats.ask_levels = self.asks.len();
        self.stats.last_ts_event = Some(ev.ts_event);

        Ok(())
    }

    /// Discard all levels and the id index unconditionally.
    fn clear(&mut self) {
        self.orders_by_id.clear();
        self.bids.clear();
        self.asks.clear();
    }

    fn add(
        &mut self,
        ts_event: i64,
        side: Side,
        order_id: u64,
        price: i64,
        size: u32,
        flags: EventFlags,
    ) -> Result<()> {
        let order = Order {
            id: order_id,
            ts_event,
            price,
            size,
            side,
            is_tob: flags.is_tob(),
        };
        if order.is_tob {
            // The feed reports only an aggregated top level for this side:
            // any prior discrete orders are stale. The synthetic order has
            // no cancel/modify identity and stays out of the index.
            let levels = side_levels(&mut self.bids, &mut self.asks, side)?;
            levels.clear();
            levels.insert(price, vec![order]);
        } else {
            if self.orders_by_id.contains_key(&order_id) {
                return Err(BookError::DuplicateOrderId(order_id));
            }
            let levels = side_levels(&mut self.bids, &mut self.asks, side)?;
            levels.entry(price).or_default().push(order);
            self.orders_by_id
                .insert(order_id, PriceAndSide { price, side });
        }
        Ok(())
    }

    fn cancel(&mut self, side: Side, order_id: u64, price: i64, size: u32) -> Result<()> {
        let levels = side_levels(&mut self.bids, &mut self.asks, side)?;
        let queue = levels
            .get_mut(&price)
            .ok_or(BookError::UnknownLevel { side, price })?;
        let pos = queue
            .iter()
            .position(|order| order.id == order_id)
            .ok_or(BookError::UnknownOrder(order_id))?;

        let resting = queue[pos].size;
        if resting < size {
            return Err(BookError::OverCancel {
                order_id,
                resting,
                cancel: size,
            });
        }

        queue[pos].size = resting - size;
        if queue[pos].size == 0 {
            queue.remove(pos);
            let level_emptied = queue.is_empty();
            if level_emptied {
                levels.remove(&price);
            }
            self.orders_by_id.remove(&order_id);
        }
        Ok(())
    }

    fn modify(
        &mut self,
        ts_event: i64,
        side: Side,
        order_id: u64,
        price: i64,
        size: u32,
        flags: EventFlags,
    ) -> Result<()> {
        let entry = match self.orders_by_id.get(&order_id) {
            Some(entry) => *entry,
            // A modify for an unknown order is an implicit add.
            None => return self.add(ts_event, side, order_id, price, size, flags),
        };
        if entry.side != side {
            return Err(BookError::SideMismatch(order_id));
        }

        let levels = side_levels(&mut self.bids, &mut self.asks, side)?;
        let prev_price = entry.price;
        let queue = levels
            .get_mut(&prev_price)
            .ok_or(BookError::UnknownOrder(order_id))?;
        let pos = queue
            .iter()
            .position(|order| order.id == order_id)
            .ok_or(BookError::UnknownOrder(order_id))?;

        if prev_price != price {
            // Changing price loses time priority: move to the back of the
            // new level's queue.
            let mut order = queue.remove(pos);
            let level_emptied = queue.is_empty();
            if level_emptied {
                levels.remove(&prev_price);
            }
            order.price = price;
            order.ts_event = ts_event;
            order.size = size;
            levels.entry(price).or_default().push(order);
            self.orders_by_id
                .insert(order_id, PriceAndSide { price, side });
        } else if queue[pos].size < size {
            // Increasing size also loses priority, but keeps the price.
            let mut order = queue.remove(pos);
            order.ts_event = ts_event;
            order.size = size;
            queue.push(order);
        } else {
            // Unchanged or decreasing size keeps queue position.
            queue[pos].size = size;
        }
        Ok(())
    }

    /// Top level on each side, or the empty sentinel where a side is bare.
    pub fn bbo(&self) -> (PriceLevel, PriceLevel) {
        (self.level_at(Side::Bid, 0), self.level_at(Side::Ask, 0))
    }

    /// The Nth level on a side: bids highest-first, asks lowest-first.
    /// Returns the empty sentinel when out of range.
    pub fn level_at(&self, side: Side, index: usize) -> PriceLevel {
        let entry = match side {
            Side::Bid => self.bids.iter().rev().nth(index),
            Side::Ask => self.asks.iter().nth(index),
            Side::None => None,
        };
        entry
            .map(|(&price, queue)| aggregate_level(price, queue))
            .unwrap_or_default()
    }

    /// The level resting at an exact price.
    ///
    /// # Errors
    /// [`BookError::UnknownLevel`] if no level exists at that price.
    pub fn level_at_price(&self, side: Side, price: i64) -> Result<PriceLevel> {
        let levels = match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
            Side::None => return Err(BookError::InvalidSide(side.to_byte())),
        };
        levels
            .get(&price)
            .map(|queue| aggregate_level(price, queue))
            .ok_or(BookError::UnknownLevel { side, price })
    }

    /// Produce a fixed-depth snapshot, padding short sides with empty levels.
    pub fn snapshot(&self, depth: usize) -> Snapshot {
        let mut bids = self.bids.iter().rev();
        let mut asks = self.asks.iter();
        let mut levels = Vec::with_capacity(depth);
        for _ in 0..depth {
            let bid = bids
                .next()
                .map(|(&price, queue)| aggregate_level(price, queue))
                .unwrap_or_default();
            let ask = asks
                .next()
                .map(|(&price, queue)| aggregate_level(price, queue))
                .unwrap_or_default();
            levels.push(LevelPair { bid, ask });
        }
        Snapshot { levels }
    }

    /// Number of live indexed orders.
    pub fn order_count(&self) -> usize {
        self.orders_by_id.len()
    }

    /// Number of price levels on the bid side.
    pub fn bid_level_count(&self) -> usize {
        self.bids.len()
    }

    /// Number of price levels on the ask side.
    pub fn ask_level_count(&self) -> usize {
        self.asks.len()
    }

    /// Get current statistics.
    pub fn stats(&self) -> &BookStats {
        &self.stats
    }
}
