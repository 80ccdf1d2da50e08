//! Timing feed ingestion.
//!
//! A timing feed is a list of finish records in arrival order. Each line
//! holds a bib number and a finish time, either of which may be `?` when it
//! was not captured, followed by an optional free-text comment:
//!
//! ```text
//! 101   0:41:07
//! ?     0:41:09   # runner's number not visible
//! 115   ?
//! ```
//!
//! A race may have a secondary feed (e.g. a paper backup log) appended after
//! the primary one. The boundary is kept so later stages can tell which
//! records came from the lower-confidence source.

use std::collections::HashMap;

use serde::Serialize;

use crate::entry::{Entries, strip_comment};
use crate::error::IngestionError;
use crate::time::RaceTime;
use crate::types::Bib;

/// Marker used in a feed for a value that was not captured.
const UNKNOWN: &str = "?";

/// Which feed a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    Primary,
    Secondary,
}

/// The text of one timing feed and the name used to report errors in it.
#[derive(Debug, Clone, Copy)]
pub struct TimingFeed<'a> {
    pub name: &'a str,
    pub text: &'a str,
}

/// One observed finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult {
    /// `None` when the bib number was not captured.
    pub bib: Option<Bib>,

    /// `None` when the time was not captured.
    pub finish: Option<RaceTime>,

    /// Comments from the feed followed by notes added during recovery.
    pub annotations: Vec<String>,

    pub source: FeedSource,

    /// Line number within the source feed.
    pub line: usize,
}

impl RawResult {
    pub(crate) fn annotate(&mut self, note: impl Into<String>) {
        self.annotations.push(note.into());
    }
}

/// All records of a race in arrival order.
#[derive(Debug, Clone)]
pub struct RawResults {
    pub records: Vec<RawResult>,

    /// Index of the first record taken from the secondary feed.
    pub secondary_start: Option<usize>,

    primary_name: String,
    secondary_name: Option<String>,
}

impl RawResults {
    /// Name of the feed a record came from.
    pub fn feed_name(&self, source: FeedSource) -> &str {
        match source {
            FeedSource::Primary => &self.primary_name,
            FeedSource::Secondary => self.secondary_name.as_deref().unwrap_or("secondary feed"),
        }
    }

    /// Number of records whose bib is still unknown.
    pub fn unknown_bibs(&self) -> usize {
        self.records.iter().filter(|r| r.bib.is_none()).count()
    }
}

fn next_field<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (field, remainder) = trimmed.split_at(end);
    *rest = remainder;
    Some(field)
}

/// Parses one feed, checking that recorded times never go backwards.
pub fn parse_feed(
    feed: TimingFeed<'_>,
    source: FeedSource,
) -> Result<Vec<RawResult>, IngestionError> {
    let mut records = Vec::new();
    let mut previous: Option<RaceTime> = None;

    for (idx, raw_line) in feed.text.lines().enumerate() {
        let line = idx + 1;
        let mut rest = strip_comment(raw_line).trim();
        if rest.is_empty() {
            continue;
        }
        let malformed = |reason: String| IngestionError::Malformed {
            feed: feed.name.to_string(),
            line,
            reason,
        };

        let bib_field = next_field(&mut rest).unwrap_or(UNKNOWN);
        let time_field =
            next_field(&mut rest).ok_or_else(|| malformed("missing finish time".to_string()))?;
        let comment = rest.trim();

        let bib = if bib_field == UNKNOWN {
            None
        } else {
            Some(bib_field.parse::<Bib>().map_err(|e| malformed(e.to_string()))?)
        };

        let finish = if time_field == UNKNOWN {
            None
        } else {
            let time: RaceTime = time_field.parse().map_err(|e| malformed(format!("{e}")))?;
            if time.is_negative() {
                return Err(malformed(format!("finish time {time} is negative")));
            }
            Some(time)
        };

        if let Some(time) = finish {
            if let Some(previous) = previous.filter(|&p| time < p) {
                return Err(IngestionError::OutOfOrder {
                    feed: feed.name.to_string(),
                    line,
                    time,
                    previous,
                });
            }
            previous = Some(time);
        }

        let mut record = RawResult {
            bib,
            finish,
            annotations: Vec::new(),
            source,
            line,
        };
        if !comment.is_empty() {
            record.annotate(comment);
        }
        records.push(record);
    }

    tracing::debug!(feed = feed.name, records = records.len(), "parsed timing feed");
    Ok(records)
}

/// Parses the primary feed and, if present, appends the secondary feed.
///
/// Times are checked for ordering within each feed separately.
pub fn ingest(
    primary: TimingFeed<'_>,
    secondary: Option<TimingFeed<'_>>,
) -> Result<RawResults, IngestionError> {
    let mut records = parse_feed(primary, FeedSource::Primary)?;
    let mut secondary_start = None;
    if let Some(feed) = secondary {
        secondary_start = Some(records.len());
        records.extend(parse_feed(feed, FeedSource::Secondary)?);
    }
    Ok(RawResults {
        records,
        secondary_start,
        primary_name: primary.name.to_string(),
        secondary_name: secondary.map(|feed| feed.name.to_string()),
    })
}

/// Checks every known bib against the entries.
///
/// A bib must be registered and may finish at most once per segment.
pub fn validate_bibs(
    raw: &RawResults,
    entries: &Entries,
    segments: usize,
) -> Result<(), IngestionError> {
    let mut counts: HashMap<Bib, usize> = HashMap::new();
    for record in &raw.records {
        let Some(bib) = record.bib else {
            continue;
        };
        let feed = raw.feed_name(record.source).to_string();
        if entries.get(bib).is_none() {
            return Err(IngestionError::UnregisteredBib {
                feed,
                line: record.line,
                bib,
            });
        }
        let count = counts.entry(bib).or_insert(0);
        *count += 1;
        if *count > segments {
            return Err(if segments == 1 {
                IngestionError::DuplicateBib {
                    feed,
                    line: record.line,
                    bib,
                }
            } else {
                IngestionError::SurplusResult {
                    feed,
                    line: record.line,
                    bib,
                }
            });
        }
    }
    Ok(())
}
