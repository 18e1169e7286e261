//! # mbo-depth-replay
//!
//! Order book reconstruction from market-by-order (MBO) event feeds, with
//! incremental depth-update streaming for replay and analytics pipelines.
//!
//! Given a totally ordered stream of already-decoded order events, this
//! library rebuilds per-instrument, per-publisher books deterministically
//! and converts successive book snapshots into a change-only stream of
//! depth commands for a downstream consumer.
//!
//! ## Features
//!
//! - **MBO reconstruction**: Add/Cancel/Modify/Clear with per-order identity,
//!   time priority, and top-of-book aggregate handling; no trade matching
//! - **Multi-source registry**: books keyed by (instrument, publisher) with
//!   cross-source aggregated best-bid-offer
//! - **Snapshot diffing**: minimal add/modify/delete command streams keyed
//!   on fixed-point prices, emitted in increasing price order
//! - **Replay driving**: group-boundary gating and burst debouncing as
//!   explicit caller-owned state
//!
//! ## Quick Start
//!
//! ### Reconstruct a single book
//!
//! ```rust
//! use mbo_depth_replay::{Action, MboEvent, OrderBook, Side};
//!
//! let mut book = OrderBook::new();
//!
//! book.apply(&MboEvent::new(
//!     1001,                    // order_id
//!     Action::Add,             // action
//!     Side::Bid,               // side
//!     100_000_000_000,         // price (100.0 in fixed-point)
//!     100,                     // size
//! ))
//! .unwrap();
//!
//! let (bid, ask) = book.bbo();
//! assert_eq!(bid.price_as_f64(), Some(100.0));
//! assert!(ask.is_empty());
//! ```
//!
//! ### Stream depth commands
//!
//! ```rust
//! use mbo_depth_replay::{Action, CommandKind, DepthReplay, EventFlags, MboEvent, Side};
//!
//! let mut replay = DepthReplay::new();
//!
//! // An atomic group of two events; the second closes the group.
//! let first = MboEvent::new(1, Action::Add, Side::Bid, 100_000_000_000, 10)
//!     .with_source(42, 1)
//!     .with_timestamp(1_000_000);
//! let last = MboEvent::new(2, Action::Add, Side::Ask, 100_010_000_000, 5)
//!     .with_source(42, 1)
//!     .with_timestamp(1_000_500)
//!     .with_flags(EventFlags::empty().with_last());
//!
//! assert!(replay.apply(&first).unwrap().is_empty());
//! let commands = replay.apply(&last).unwrap();
//!
//! // First group boundary seeds the consumer: clear, then one add per level.
//! assert_eq!(commands[0].kind, CommandKind::Clear);
//! assert_eq!(commands.len(), 3);
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Core types: `MboEvent`, `Action`, `Side`, `PriceLevel`, `Snapshot` |
//! | [`book`] | Reconstruction: `OrderBook`, `Market` registry |
//! | [`depth`] | Output: `DepthCommand`, `CommandKind`, `SnapshotDiffer` |
//! | [`replay`] | Driving: `DepthReplay`, `ReplayConfig`, `SymbolMap` |
//! | [`source`] | Ingestion boundary: `MarketDataSource`, `VecSource` |
//! | [`error`] | Error types: `BookError`, `Result` |

pub mod book;
pub mod depth;
pub mod error;
pub mod replay;
pub mod source;
pub mod types;

// Re-exports - Core types
pub use error::{BookError, Result};
pub use types::{
    px_to_f64, Action, EventFlags, LevelPair, MboEvent, Order, PriceLevel, Side, Snapshot,
    PRICE_SCALE, UNDEF_PRICE,
};

// Re-exports - Book reconstruction
pub use book::{BookStats, Market, MarketStats, OrderBook, SourceBook};

// Re-exports - Depth command output
pub use depth::{CommandKind, DepthCommand, SnapshotDiffer, FLAG_SEED, FLAG_UPDATE};

// Re-exports - Replay driving
pub use replay::{DepthReplay, ReplayConfig, ReplayStats, SymbolMap};

// Re-exports - Source abstraction
pub use source::{MarketDataSource, SourceMetadata, VecSource};
