//! Core data types for MBO events, book levels, and snapshots.
//!
//! Prices are signed 64-bit fixed-point with 1e-9 resolution, matching the
//! upstream feed convention. `UNDEF_PRICE` is the reserved sentinel for an
//! empty level; it is never a valid traded price.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BookError;

/// Fixed-point price resolution: one unit of price equals 1e9 ticks.
pub const PRICE_SCALE: f64 = 1e9;

/// Reserved "undefined price" sentinel marking an empty level.
pub const UNDEF_PRICE: i64 = i64::MAX;

/// Convert a fixed-point price to floating-point units.
#[inline]
pub fn px_to_f64(price: i64) -> f64 {
    price as f64 / PRICE_SCALE
}

/// MBO action type (what happened to the order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// Add a new order to the book
    Add = b'A',
    /// Cancel (reduce or remove) an existing order
    Cancel = b'C',
    /// Modify an existing order's price and/or size
    Modify = b'M',
    /// Discard the entire book
    Clear = b'R',
    /// Trade execution; book-neutral, an explicit Cancel follows
    Trade = b'T',
    /// Fill; book-neutral, an explicit Cancel follows
    Fill = b'F',
}

impl Action {
    /// Parse action from its feed byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Action::Add),
            b'C' => Some(Action::Cancel),
            b'M' => Some(Action::Modify),
            b'R' => Some(Action::Clear),
            b'T' => Some(Action::Trade),
            b'F' => Some(Action::Fill),
            _ => None,
        }
    }

    /// Convert to byte representation.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Action {
    type Error = BookError;

    fn try_from(byte: u8) -> Result<Self, BookError> {
        Action::from_byte(byte).ok_or(BookError::UnrecognizedAction(byte))
    }
}

/// Order side (bid or ask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy order (bid)
    Bid = b'B',
    /// Sell order (ask)
    Ask = b'A',
    /// Non-directional (used for some trade types)
    None = b'N',
}

impl Side {
    /// Parse side from its feed byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'B' => Some(Side::Bid),
            b'A' => Some(Side::Ask),
            b'N' => Some(Side::None),
            _ => None,
        }
    }

    /// Convert to byte representation.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Check if this is a bid.
    #[inline(always)]
    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }

    /// Check if this is an ask.
    #[inline(always)]
    pub fn is_ask(self) -> bool {
        matches!(self, Side::Ask)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => f.write_str("bid"),
            Side::Ask => f.write_str("ask"),
            Side::None => f.write_str("none"),
        }
    }
}

impl TryFrom<u8> for Side {
    type Error = BookError;

    fn try_from(byte: u8) -> Result<Self, BookError> {
        Side::from_byte(byte).ok_or(BookError::InvalidSide(byte))
    }
}

/// Per-event flag bits, matching the upstream feed layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventFlags(u8);

impl EventFlags {
    /// Marks the last event in an atomic event group.
    pub const LAST: u8 = 1 << 7;

    /// Marks a top-of-book event: the order is a synthetic aggregate of the
    /// whole side's best level rather than a discrete resting order.
    pub const TOB: u8 = 1 << 6;

    /// No flags set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Build from raw flag bits.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw flag bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether this event completes an atomic event group.
    #[inline]
    pub fn is_last(self) -> bool {
        self.0 & Self::LAST != 0
    }

    /// Whether this event carries an aggregated top-of-book order.
    #[inline]
    pub fn is_tob(self) -> bool {
        self.0 & Self::TOB != 0
    }

    /// Set the last-in-group bit.
    pub fn with_last(self) -> Self {
        Self(self.0 | Self::LAST)
    }

    /// Set the top-of-book bit.
    pub fn with_tob(self) -> Self {
        Self(self.0 | Self::TOB)
    }
}

/// Market-by-order event.
///
/// A single, already-decoded order book event. All fields use fixed-size
/// types for predictable layout; the event header identifies the
/// (instrument, publisher) pair the event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MboEvent {
    /// Instrument the event belongs to
    pub instrument_id: u32,

    /// Publishing venue/feed the event came from
    pub publisher_id: u16,

    /// Event timestamp (nanoseconds since epoch)
    pub ts_event: i64,

    /// Order action (add, cancel, modify, clear, trade, fill)
    pub action: Action,

    /// Order side (bid or ask)
    pub side: Side,

    /// Unique order identifier
    pub order_id: u64,

    /// Price in fixed-point format (divide by 1e9 for units)
    pub price: i64,

    /// Order size in shares/contracts
    pub size: u32,

    /// Per-event flag bits
    pub flags: EventFlags,
}

impl MboEvent {
    /// Create a new MBO event for instrument 0, publisher 0, at timestamp 0.
    pub fn new(order_id: u64, action: Action, side: Side, price: i64, size: u32) -> Self {
        Self {
            instrument_id: 0,
            publisher_id: 0,
            ts_event: 0,
            action,
            side,
            order_id,
            price,
            size,
            flags: EventFlags::empty(),
        }
    }

    /// Set the event timestamp.
    pub fn with_timestamp(mut self, ts_event: i64) -> Self {
        self.ts_event = ts_event;
        self
    }

    /// Set the (instrument, publisher) header.
    pub fn with_source(mut self, instrument_id: u32, publisher_id: u16) -> Self {
        self.instrument_id = instrument_id;
        self.publisher_id = publisher_id;
        self
    }

    /// Set the event flags.
    pub fn with_flags(mut self, flags: EventFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Get price as floating-point units.
    #[inline]
    pub fn price_as_f64(&self) -> f64 {
        px_to_f64(self.price)
    }
}

/// A resting order as stored in the book.
///
/// Owned exclusively by the level queue it currently resides in; modifies
/// move the order between queues rather than copying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub id: u64,
    pub ts_event: i64,
    pub price: i64,
    pub size: u32,
    pub side: Side,
    /// Synthetic aggregated top-of-book entry; excluded from level counts
    /// and never indexed by id.
    pub is_tob: bool,
}

/// Read-only aggregated view of one price point on one side.
///
/// `count` excludes top-of-book orders, signaling an aggregated synthetic
/// entry rather than discrete resting orders. An empty level carries the
/// `UNDEF_PRICE` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Level price, or `UNDEF_PRICE` when empty
    pub price: i64,

    /// Aggregate size across all resident orders
    pub size: u32,

    /// Number of discrete resting orders
    pub count: u32,
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self {
            price: UNDEF_PRICE,
            size: 0,
            count: 0,
        }
    }
}

impl PriceLevel {
    /// The empty level sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this level is the empty sentinel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.price == UNDEF_PRICE
    }

    /// Level price as floating-point units, or `None` when empty.
    #[inline]
    pub fn price_as_f64(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(px_to_f64(self.price))
        }
    }
}

impl fmt::Display for PriceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("empty")
        } else {
            write!(
                f,
                "{} @ {:.9} | {} order(s)",
                self.size,
                px_to_f64(self.price),
                self.count
            )
        }
    }
}

/// One depth row of a snapshot: the Nth bid level paired with the Nth ask
/// level, either possibly empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelPair {
    pub bid: PriceLevel,
    pub ask: PriceLevel,
}

/// Point-in-time, fixed-depth view of both sides of a book.
///
/// Immutable once produced; callers retain the previous snapshot to diff
/// against the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Level pairs ordered best-first (row 0 = top of book).
    pub levels: Vec<LevelPair>,
}

impl Snapshot {
    /// Number of depth rows (including empty padding rows).
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Iterate over the level pairs, best-first.
    pub fn iter(&self) -> impl Iterator<Item = &LevelPair> {
        self.levels.iter()
    }
}
