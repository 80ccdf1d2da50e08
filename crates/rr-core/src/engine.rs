//! The results pipeline.
//!
//! [`compute`] runs every stage in order over an immutable snapshot of one
//! race: validate configuration, ingest, validate bibs, recover missing data,
//! resolve times, rank and allocate prizes. Identical inputs produce
//! identical output.

use serde::Serialize;

use crate::entry::Entries;
use crate::error::EngineError;
use crate::ingest::{FeedSource, RawResults, TimingFeed, ingest, validate_bibs};
use crate::prizes::{PrizeList, allocate_prizes};
use crate::race::Race;
use crate::ranking::{LegResult, OverallResult, leg_standings, rank};
use crate::recovery::{guess_bibs, interpolate_times};
use crate::resolution::resolve_times;

/// The timing feeds of one race.
#[derive(Debug, Clone, Copy)]
pub struct TimingFeeds<'a> {
    pub primary: TimingFeed<'a>,
    /// Lower-confidence backup records, appended after the primary feed.
    pub secondary: Option<TimingFeed<'a>>,
}

/// Everything computed for one race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceResults {
    pub race: String,
    pub segments: usize,
    pub overall: Vec<OverallResult>,
    pub prizes: Vec<PrizeList>,
    /// Recovery and consistency notes for the organisers to review.
    pub notes: Vec<String>,
}

impl RaceResults {
    /// Standings for one 0-based segment.
    pub fn leg_standings(&self, segment: usize) -> Vec<LegResult> {
        leg_standings(&self.overall, segment)
    }
}

/// Notes for every record that recovery touched or the feed commented on.
fn record_notes(raw: &RawResults) -> Vec<String> {
    raw.records
        .iter()
        .filter(|record| !record.annotations.is_empty())
        .map(|record| {
            let bib = record
                .bib
                .map_or_else(|| "?".to_string(), |bib| bib.to_string());
            let time = record
                .finish
                .map_or_else(|| "?".to_string(), |time| time.to_string());
            let source = match record.source {
                FeedSource::Primary => "",
                FeedSource::Secondary => " (secondary)",
            };
            format!(
                "{} line {}{source}: bib {bib} {time}: {}",
                raw.feed_name(record.source),
                record.line,
                record.annotations.join("; ")
            )
        })
        .collect()
}

/// Entries that no prize category includes.
fn category_warnings(race: &Race, entries: &Entries) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| {
            race.categories
                .entry_category(entry.category.as_str())
                .is_some_and(|category| !race.categories.has_prize_for(category))
        })
        .map(|entry| {
            format!(
                "bib {} ({}): category {} is not eligible for any prize",
                entry.bib, entry.name, entry.category
            )
        })
        .collect()
}

/// Computes results, standings and prizes for one race.
pub fn compute(
    race: &Race,
    entries: &Entries,
    feeds: TimingFeeds<'_>,
) -> Result<RaceResults, EngineError> {
    race.validate()?;
    race.validate_bibs(entries)?;
    let segments = race.segments();

    let raw = ingest(feeds.primary, feeds.secondary)?;
    validate_bibs(&raw, entries, segments)?;
    tracing::debug!(
        race = %race.name,
        records = raw.records.len(),
        unknown_bibs = raw.unknown_bibs(),
        "ingested timing feeds"
    );

    let raw = guess_bibs(interpolate_times(raw), entries, segments);
    let mut notes = record_notes(&raw);

    let resolution = resolve_times(race, entries, &raw);
    notes.extend(resolution.notes);

    let overall = rank(race, entries, resolution.participants);
    let (overall, prizes) = allocate_prizes(overall, &race.categories);

    notes.extend(category_warnings(race, entries));

    tracing::info!(
        race = %race.name,
        results = overall.len(),
        notes = notes.len(),
        "computed race results"
    );

    Ok(RaceResults {
        race: race.name.clone(),
        segments,
        overall,
        prizes,
        notes,
    })
}
