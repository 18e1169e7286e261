//! Market data source abstraction for flexible event ingestion.
//!
//! The core consumes already-decoded [`MboEvent`] records; decoding a
//! vendor's binary container lives behind this trait, outside the crate.
//!
//! # Design Goals
//!
//! - **Provider agnostic**: works with any feed that can surface typed events
//! - **Iterator based**: simple streaming interface
//! - **Metadata support**: symbol, date, and provenance for labeling
//! - **Testable**: trivially mocked with [`VecSource`]
//!
//! # Implementing Custom Sources
//!
//! ```
//! use mbo_depth_replay::{MarketDataSource, MboEvent, Result, SourceMetadata};
//!
//! struct MyDataSource {
//!     events: Vec<MboEvent>,
//!     metadata: SourceMetadata,
//! }
//!
//! impl MarketDataSource for MyDataSource {
//!     type EventIter = std::vec::IntoIter<MboEvent>;
//!
//!     fn events(self) -> Result<Self::EventIter> {
//!         Ok(self.events.into_iter())
//!     }
//!
//!     fn metadata(&self) -> &SourceMetadata {
//!         &self.metadata
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::MboEvent;

/// Metadata about a market data source.
///
/// Useful for logging, validation, and organizing output files.
#[derive(Debug, Clone, Default)]
pub struct SourceMetadata {
    /// Trading symbol (e.g., "MESZ4")
    pub symbol: Option<String>,

    /// Trading date in YYYY-MM-DD format
    pub date: Option<String>,

    /// Original file path (if loaded from file)
    pub file_path: Option<PathBuf>,

    /// Data provider name
    pub provider: Option<String>,

    /// Estimated event count (for progress tracking)
    pub estimated_events: Option<u64>,
}

impl SourceMetadata {
    /// Create new empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Set the date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Set the file path.
    pub fn with_file_path(mut self, path: impl AsRef<Path>) -> Self {
        self.file_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the provider name.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Set the estimated event count.
    pub fn with_estimated_events(mut self, count: u64) -> Self {
        self.estimated_events = Some(count);
        self
    }
}

/// A source of already-decoded MBO events.
pub trait MarketDataSource {
    /// Iterator over the source's events in feed order.
    type EventIter: Iterator<Item = MboEvent>;

    /// Consume the source and return its event stream.
    fn events(self) -> Result<Self::EventIter>;

    /// Metadata about the data being processed.
    fn metadata(&self) -> &SourceMetadata;
}

/// In-memory source backed by a `Vec`, for tests and synthetic replays.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    events: Vec<MboEvent>,
    metadata: SourceMetadata,
}

impl VecSource {
    /// Create a source over a materialized event list.
    pub fn new(events: Vec<MboEvent>) -> Self {
        Self {
            events,
            metadata: SourceMetadata::default(),
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Number of events held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the source holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl MarketDataSource for VecSource {
    type EventIter = std::vec::IntoIter<MboEvent>;

    fn events(self) -> Result<Self::EventIter> {
        Ok(self.events.into_iter())
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}
