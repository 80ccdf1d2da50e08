//! Core results computation for race timing.
//!
//! This crate turns entries and raw finish records into published results:
//! - Ingestion: parsing timing feeds and checking bibs against the entries
//! - Recovery: interpolating missing times and guessing missing bib numbers
//! - Resolution: per-segment starts and durations, including mass starts
//! - Ranking: overall and leg standings with tie-breaks and dead heats
//! - Prizes: two-pass allocation across categories with exclusivity
//!
//! [`compute`] runs the whole pipeline for one race.

pub mod category;
pub mod engine;
pub mod entry;
pub mod error;
pub mod ingest;
pub mod prizes;
pub mod race;
pub mod ranking;
pub mod recovery;
pub mod resolution;
pub mod time;
pub mod types;

pub use category::{CategoryRegistry, EntryCategory, PrizeCategory};
pub use engine::{RaceResults, TimingFeeds, compute};
pub use entry::{Entries, Entry, parse_entries};
pub use error::{ConfigurationError, ConsistencyError, EngineError, IngestionError};
pub use ingest::{FeedSource, RawResult, RawResults, TimingFeed};
pub use prizes::PrizeList;
pub use race::{Race, RaceFormat};
pub use ranking::{LegResult, OverallResult};
pub use resolution::SegmentResult;
pub use time::{Performance, RaceTime, TimeError};
pub use types::{Bib, CategoryCode, ValidationError};
