//! Replay driver: events in, depth commands out.
//!
//! This is the caller side of the core: it owns the registry, retains the
//! previous snapshot per (instrument, publisher) pair, gates snapshots on
//! the last-in-group flag, and applies the minimum-interval filter between
//! consecutive group boundaries before invoking the differ. All of this is
//! explicit state owned here, never process-wide globals.
//!
//! # Example
//!
//! ```
//! use mbo_depth_replay::{Action, DepthReplay, EventFlags, MboEvent, Side};
//!
//! let mut replay = DepthReplay::new();
//! let ev = MboEvent::new(1, Action::Add, Side::Bid, 100_000_000_000, 10)
//!     .with_source(42, 1)
//!     .with_timestamp(1_000_000)
//!     .with_flags(EventFlags::empty().with_last());
//!
//! // The first completed group seeds the consumer: clear + adds.
//! let commands = replay.apply(&ev).unwrap();
//! assert_eq!(commands.len(), 2);
//! ```

use ahash::AHashMap;

use crate::book::Market;
use crate::depth::{DepthCommand, SnapshotDiffer};
use crate::error::Result;
use crate::types::{MboEvent, Snapshot, PRICE_SCALE};

/// Configuration for the replay driver.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Snapshot depth in level pairs
    pub depth: usize,

    /// Minimum interval between emitted group boundaries (nanoseconds);
    /// groups arriving faster coalesce into the next qualifying snapshot
    pub debounce_ns: i64,

    /// Divisor applied to fixed-point prices on command output
    pub price_scale: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            depth: 100,
            debounce_ns: 1_000,
            price_scale: PRICE_SCALE,
        }
    }
}

impl ReplayConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot depth.
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Set the minimum interval between emitted snapshots.
    pub fn with_debounce_ns(mut self, debounce_ns: i64) -> Self {
        self.debounce_ns = debounce_ns;
        self
    }

    /// Set the output price divisor.
    pub fn with_price_scale(mut self, price_scale: f64) -> Self {
        self.price_scale = price_scale;
        self
    }
}

/// Statistics for replay progress.
#[derive(Debug, Clone, Default)]
pub struct ReplayStats {
    /// Total events applied
    pub events: u64,

    /// Group boundaries observed (last-in-group events)
    pub groups: u64,

    /// Group boundaries coalesced by the interval filter
    pub debounced: u64,

    /// Snapshots taken and diffed
    pub snapshots: u64,

    /// Depth commands emitted
    pub commands: u64,
}

/// Replay driver owning a [`Market`] and the per-book diffing state.
pub struct DepthReplay {
    config: ReplayConfig,
    market: Market,
    differ: SnapshotDiffer,
    previous: AHashMap<(u32, u16), Snapshot>,
    last_group_ts: AHashMap<(u32, u16), i64>,
    stats: ReplayStats,
}

impl Default for DepthReplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthReplay {
    /// Create a driver with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ReplayConfig::default())
    }

    /// Create a driver with a custom configuration.
    pub fn with_config(config: ReplayConfig) -> Self {
        let differ = SnapshotDiffer::new().with_price_scale(config.price_scale);
        Self {
            config,
            market: Market::new(),
            differ,
            previous: AHashMap::new(),
            last_group_ts: AHashMap::new(),
            stats: ReplayStats::default(),
        }
    }

    /// Apply one event; returns the depth commands it released.
    ///
    /// Events that do not complete an atomic group, and group boundaries
    /// arriving within the configured interval of the previous one, return
    /// an empty command list. The interval anchor still advances on a
    /// coalesced group, so a sustained burst keeps deferring until a gap
    /// opens up.
    ///
    /// # Errors
    /// Book protocol violations propagate from the underlying apply; the
    /// routed book keeps its state as of the last successful action.
    pub fn apply(&mut self, ev: &MboEvent) -> Result<Vec<DepthCommand>> {
        self.market.apply(ev)?;
        self.stats.events += 1;

        if !ev.flags.is_last() {
            return Ok(Vec::new());
        }
        self.stats.groups += 1;

        let key = (ev.instrument_id, ev.publisher_id);
        if let Some(prev_ts) = self.last_group_ts.insert(key, ev.ts_event) {
            if ev.ts_event - prev_ts < self.config.debounce_ns {
                self.stats.debounced += 1;
                return Ok(Vec::new());
            }
        }

        let snapshot = self
            .market
            .book(ev.instrument_id, ev.publisher_id)?
            .snapshot(self.config.depth);
        self.stats.snapshots += 1;

        let commands = self
            .differ
            .diff(ev.ts_event, self.previous.get(&key), &snapshot);
        self.previous.insert(key, snapshot);
        self.stats.commands += commands.len() as u64;
        Ok(commands)
    }

    /// The owned registry.
    pub fn market(&self) -> &Market {
        &self.market
    }

    /// The active configuration.
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Get current statistics.
    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }
}

/// Instrument id to human-readable symbol mapping.
///
/// Labeling state only: book routing never consults it. Owned by whoever
/// drives the replay and filled from venue metadata.
#[derive(Debug, Clone, Default)]
pub struct SymbolMap {
    symbols: AHashMap<u32, String>,
}

impl SymbolMap {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a symbol for an instrument.
    pub fn insert(&mut self, instrument_id: u32, symbol: impl Into<String>) {
        self.symbols.insert(instrument_id, symbol.into());
    }

    /// Resolve an instrument id, if known.
    pub fn symbol(&self, instrument_id: u32) -> Option<&str> {
        self.symbols.get(&instrument_id).map(String::as_str)
    }

    /// Number of known instruments.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
