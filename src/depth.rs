//! Depth-update commands and the snapshot differ.
//!
//! The differ turns two point-in-time book snapshots into the minimal
//! ordered sequence of commands a downstream consumer needs to transform
//! one into the other. It operates on aggregated levels keyed by price, not
//! on individual orders.
//!
//! Diffing is keyed on the fixed-point integer price; the price is only
//! converted to floating point for the emitted command, so equality checks
//! never go through a derived float.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{PriceLevel, Side, Snapshot, PRICE_SCALE};

/// Depth command kind, in the reference wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandKind {
    /// Reset the consumer's book
    Clear = 1,
    /// Insert a bid level
    AddBid = 2,
    /// Insert an ask level
    AddAsk = 3,
    /// Replace a bid level's count and quantity
    ModifyBid = 4,
    /// Replace an ask level's count and quantity
    ModifyAsk = 5,
    /// Remove a bid level
    DeleteBid = 6,
    /// Remove an ask level
    DeleteAsk = 7,
}

impl CommandKind {
    /// Parse from the wire byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(CommandKind::Clear),
            2 => Some(CommandKind::AddBid),
            3 => Some(CommandKind::AddAsk),
            4 => Some(CommandKind::ModifyBid),
            5 => Some(CommandKind::ModifyAsk),
            6 => Some(CommandKind::DeleteBid),
            7 => Some(CommandKind::DeleteAsk),
            _ => None,
        }
    }

    /// Convert to the wire byte.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

fn add_kind(side: Side) -> CommandKind {
    if side.is_bid() {
        CommandKind::AddBid
    } else {
        CommandKind::AddAsk
    }
}

fn modify_kind(side: Side) -> CommandKind {
    if side.is_bid() {
        CommandKind::ModifyBid
    } else {
        CommandKind::ModifyAsk
    }
}

fn delete_kind(side: Side) -> CommandKind {
    if side.is_bid() {
        CommandKind::DeleteBid
    } else {
        CommandKind::DeleteAsk
    }
}

/// Flag value on seed commands (initial book image).
pub const FLAG_SEED: u8 = 0;

/// Flag value on steady-state incremental commands.
pub const FLAG_UPDATE: u8 = 1;

/// One incremental depth change for the downstream consumer.
///
/// The side is implicit in the command kind; the price is already scaled to
/// the configured output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthCommand {
    /// Timestamp of the snapshot that produced this command
    pub ts_event: i64,

    /// Command kind (side-tagged add/modify/delete, or clear)
    pub kind: CommandKind,

    /// Batch-boundary flag: `FLAG_SEED` or `FLAG_UPDATE`
    pub flag: u8,

    /// Order count at the level (zero on delete and clear)
    pub orders: u32,

    /// Level price in output units (zero on clear)
    pub price: f64,

    /// Aggregate quantity at the level (zero on delete and clear)
    pub quantity: u32,
}

/// A level tagged with the side it belonged to in its snapshot.
#[derive(Debug, Clone, Copy)]
struct SideEntry {
    side: Side,
    orders: u32,
    quantity: u32,
}

/// Collect a snapshot's non-empty levels into a price-keyed, price-sorted map.
fn price_map(snapshot: &Snapshot) -> BTreeMap<i64, SideEntry> {
    let mut map = BTreeMap::new();
    let mut tag = |level: &PriceLevel, side: Side| {
        if !level.is_empty() {
            map.insert(
                level.price,
                SideEntry {
                    side,
                    orders: level.count,
                    quantity: level.size,
                },
            );
        }
    };
    for pair in snapshot.iter() {
        tag(&pair.bid, Side::Bid);
        tag(&pair.ask, Side::Ask);
    }
    map
}

/// Stateless snapshot differ.
///
/// Holds only the output price resolution; the caller retains the previous
/// snapshot between invocations.
///
/// # Example
/// ```
/// use mbo_depth_replay::{CommandKind, LevelPair, PriceLevel, Snapshot, SnapshotDiffer};
///
/// let differ = SnapshotDiffer::new();
/// let current = Snapshot {
///     levels: vec![LevelPair {
///         bid: PriceLevel { price: 100_000_000_000, size: 10, count: 1 },
///         ask: PriceLevel::empty(),
///     }],
/// };
///
/// let commands = differ.diff(0, None, &current);
/// assert_eq!(commands[0].kind, CommandKind::Clear);
/// assert_eq!(commands[1].kind, CommandKind::AddBid);
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotDiffer {
    price_scale: f64,
}

impl Default for SnapshotDiffer {
    fn default() -> Self {
        Self {
            price_scale: PRICE_SCALE,
        }
    }
}

impl SnapshotDiffer {
    /// Create a differ with the default 1e-9 price resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the divisor applied to fixed-point prices on output.
    pub fn with_price_scale(mut self, price_scale: f64) -> Self {
        self.price_scale = price_scale;
        self
    }

    #[inline]
    fn out_price(&self, price: i64) -> f64 {
        price as f64 / self.price_scale
    }

    /// Seed the consumer: one clear, then one add per non-empty level, in
    /// increasing price order.
    pub fn seed(&self, ts_event: i64, current: &Snapshot) -> Vec<DepthCommand> {
        let mut commands = vec![DepthCommand {
            ts_event,
            kind: CommandKind::Clear,
            flag: FLAG_SEED,
            orders: 0,
            price: 0.0,
            quantity: 0,
        }];
        for (&price, entry) in &price_map(current) {
            commands.push(DepthCommand {
                ts_event,
                kind: add_kind(entry.side),
                flag: FLAG_SEED,
                orders: entry.orders,
                price: self.out_price(price),
                quantity: entry.quantity,
            });
        }
        commands
    }

    /// Commands transforming `previous` into `current`.
    ///
    /// With no previous snapshot this seeds instead. Within one invocation
    /// commands come out in increasing price order, so the stream replays
    /// deterministically. A price present in both snapshots emits nothing
    /// when side, count, and quantity are all unchanged.
    pub fn diff(
        &self,
        ts_event: i64,
        previous: Option<&Snapshot>,
        current: &Snapshot,
    ) -> Vec<DepthCommand> {
        let previous = match previous {
            Some(snapshot) => snapshot,
            None => return self.seed(ts_event, current),
        };

        let prev_map = price_map(previous);
        let curr_map = price_map(current);

        let mut prices: Vec<i64> = prev_map.keys().chain(curr_map.keys()).copied().collect();
        prices.sort_unstable();
        prices.dedup();

        let mut commands = Vec::new();
        for price in prices {
            match (prev_map.get(&price), curr_map.get(&price)) {
                (Some(prev), None) => {
                    commands.push(DepthCommand {
                        ts_event,
                        kind: delete_kind(prev.side),
                        flag: FLAG_UPDATE,
                        orders: 0,
                        price: self.out_price(price),
                        quantity: 0,
                    });
                }
                (None, Some(curr)) => {
                    commands.push(DepthCommand {
                        ts_event,
                        kind: add_kind(curr.side),
                        flag: FLAG_UPDATE,
                        orders: curr.orders,
                        price: self.out_price(price),
                        quantity: curr.quantity,
                    });
                }
                (Some(prev), Some(curr)) => {
                    if prev.side != curr.side {
                        // The price flipped sides: tear down, then rebuild.
                        commands.push(DepthCommand {
                            ts_event,
                            kind: delete_kind(prev.side),
                            flag: FLAG_UPDATE,
                            orders: 0,
                            price: self.out_price(price),
                            quantity: 0,
                        });
                        commands.push(DepthCommand {
                            ts_event,
                            kind: add_kind(curr.side),
                            flag: FLAG_UPDATE,
                            orders: curr.orders,
                            price: self.out_price(price),
                            quantity: curr.quantity,
                        });
                    } else if prev.orders != curr.orders || prev.quantity != curr.quantity {
                        commands.push(DepthCommand {
                            ts_event,
                            kind: modify_kind(curr.side),
                            flag: FLAG_UPDATE,
                            orders: curr.orders,
                            price: self.out_price(price),
                            quantity: curr.quantity,
                        });
                    }
                }
                (None, None) => {}
            }
        }
        commands
    }
}
