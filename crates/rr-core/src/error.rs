//! Error types for a results computation.
//!
//! Configuration and ingestion errors are fatal to the run. A consistency
//! error only removes the participant it concerns and is reported as a
//! note. Each carries enough context (feed, line, bib, leg) to correct the
//! source data. Legs are reported 1-based.

use thiserror::Error;

use crate::time::RaceTime;
use crate::types::{Bib, CategoryCode};

/// Malformed or contradictory race configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("race must have at least one segment")]
    NoSegments,

    #[error("{setting} refers to leg {leg}, but the race has {segments} leg(s)")]
    LegOutOfRange {
        setting: &'static str,
        leg: usize,
        segments: usize,
    },

    #[error("mass start on leg 1 is not allowed; the first leg always starts at the race start")]
    MassStartOnFirstLeg,

    #[error("mass start for leg {leg} ({time}) is earlier than the mass start for leg {previous_leg} ({previous})")]
    MassStartsOutOfOrder {
        leg: usize,
        time: RaceTime,
        previous_leg: usize,
        previous: RaceTime,
    },

    #[error("duplicate {kind} category: {code}")]
    DuplicateCategory { kind: &'static str, code: CategoryCode },

    #[error("{setting} refers to unknown category: {code}")]
    UnknownCategory {
        setting: &'static str,
        code: CategoryCode,
    },

    #[error("prize allocation order lists {code} more than once")]
    RepeatedAllocation { code: CategoryCode },

    #[error("prize allocation order omits {code}")]
    IncompleteAllocation { code: CategoryCode },

    #[error("time trial waves need a positive interval and at least one runner per wave")]
    InvalidWaves,

    #[error("dead heat declaration needs at least two bibs")]
    DeadHeatTooSmall,

    #[error("{setting} refers to bib {bib}, which has no entry")]
    UnknownBib { setting: &'static str, bib: Bib },
}

/// A problem with the entries or timing feeds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestionError {
    #[error("{feed} line {line}: {reason}")]
    Malformed {
        feed: String,
        line: usize,
        reason: String,
    },

    #[error("{feed} line {line}: time {time} is earlier than the preceding {previous}")]
    OutOfOrder {
        feed: String,
        line: usize,
        time: RaceTime,
        previous: RaceTime,
    },

    #[error("{feed} line {line}: duplicate bib {bib}")]
    DuplicateBib { feed: String, line: usize, bib: Bib },

    #[error("{feed} line {line}: bib {bib} has no entry")]
    UnregisteredBib { feed: String, line: usize, bib: Bib },

    #[error("{feed} line {line}: bib {bib} already has a result for every leg")]
    SurplusResult { feed: String, line: usize, bib: Bib },

    #[error("{feed} line {line}: bib {bib} has unknown category {code}")]
    UnknownCategory {
        feed: String,
        line: usize,
        bib: Bib,
        code: String,
    },

    #[error("{feed} line {line}: duplicate entry name '{name}'")]
    DuplicateName {
        feed: String,
        line: usize,
        name: String,
    },

    #[error("{feed} line {line}: bib {bib} names {found} runner(s) for {expected} leg(s)")]
    RunnerCount {
        feed: String,
        line: usize,
        bib: Bib,
        found: usize,
        expected: usize,
    },
}

/// Recorded data that contradicts the race's timing rules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("bib {bib} leg {leg}: finish {finish} is earlier than start {start}")]
    FinishBeforeStart {
        bib: Bib,
        leg: usize,
        start: RaceTime,
        finish: RaceTime,
    },
}

/// A failure that aborts a results computation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("ingestion error: {0}")]
    Ingestion(#[from] IngestionError),
}
