//! Missing-data recovery.
//!
//! Fills in finish times that were not captured and, when the counts allow
//! it, bib numbers that were not captured. Records are never removed or
//! reordered: arrival order is the reconstructed finish order.
//!
//! # Algorithm Summary
//!
//! 1. Interpolate missing times linearly between the surrounding known times,
//!    assuming finishers in a gap arrived evenly spaced.
//! 2. If the number of records equals participants × segments, guess each
//!    missing bib greedily, in arrival order, choosing the participant who
//!    is most "due" to finish.
//!
//! Both steps are best-effort reconstructions and annotate every record they
//! touch so organisers can review them.

use crate::entry::Entries;
use crate::ingest::RawResults;
use crate::time::RaceTime;
use crate::types::Bib;

pub const NOTE_FIRST_TIME: &str = "no basis for interpolation, set to first recorded time";
pub const NOTE_LAST_TIME: &str = "no basis for interpolation, set to last recorded time";
pub const NOTE_INTERPOLATED: &str = "time interpolated";
pub const NOTE_NO_TIMES: &str = "no recorded times to interpolate from";
pub const NOTE_BIB_GUESSED: &str = "bib number guessed";

/// Gives every record a finish time.
///
/// Records before the first known time take that time, records after the
/// last known time take that time, and records between two known times are
/// spaced evenly between them.
#[expect(
    clippy::cast_possible_wrap,
    reason = "record indices are far below i64::MAX"
)]
pub fn interpolate_times(mut raw: RawResults) -> RawResults {
    let records = &mut raw.records;
    let known: Vec<usize> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| record.finish.map(|_| index))
        .collect();

    let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
        for record in records.iter_mut() {
            record.annotate(NOTE_NO_TIMES);
        }
        if !records.is_empty() {
            tracing::warn!(records = records.len(), "no finish times recorded");
        }
        return raw;
    };

    let first_time = records[first].finish;
    for record in &mut records[..first] {
        record.finish = first_time;
        record.annotate(NOTE_FIRST_TIME);
    }

    let last_time = records[last].finish;
    for record in &mut records[last + 1..] {
        record.finish = last_time;
        record.annotate(NOTE_LAST_TIME);
    }

    for pair in known.windows(2) {
        let (i, j) = (pair[0], pair[1]);
        if j - i < 2 {
            continue;
        }
        let (Some(t1), Some(t2)) = (records[i].finish, records[j].finish) else {
            continue;
        };
        let span = (j - i) as i64;
        for k in 1..j - i {
            let record = &mut records[i + k];
            record.finish = Some(interpolate(t1, t2, k as i64, span));
            record.annotate(NOTE_INTERPOLATED);
        }
    }

    raw
}

/// The time `step` steps of `span` along from `from` to `to`.
fn interpolate(from: RaceTime, to: RaceTime, step: i64, span: i64) -> RaceTime {
    from + (to - from) * step / span
}

/// Ordering key for choosing whom an unidentified finish belongs to.
///
/// Fields compare in declaration order; the lowest key wins. Equal
/// `finishes_after` means both participants have a next finish or neither
/// does, so a missing next finish never competes with a present one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct GuessKey {
    finishes_before: usize,
    finishes_after: usize,
    next_finish: Option<RaceTime>,
    previous_finish: Option<RaceTime>,
    bib: Bib,
}

fn guess_key(raw: &RawResults, position: usize, bib: Bib) -> GuessKey {
    let (before, after) = raw.records.split_at(position);
    let after = &after[1..];

    let mut earlier = before.iter().filter(|r| r.bib == Some(bib));
    let finishes_before = earlier.clone().count();
    let previous_finish = earlier.next_back().and_then(|r| r.finish);

    let mut later = after.iter().filter(|r| r.bib == Some(bib));
    let finishes_after = later.clone().count();
    let next_finish = later.next().and_then(|r| r.finish);

    GuessKey {
        finishes_before,
        finishes_after,
        next_finish,
        previous_finish,
        bib,
    }
}

/// Assigns bib numbers to records that lack one.
///
/// Only attempted when every expected finish has a record, so that the
/// missing identities are fully determined by counting. Each unknown record,
/// in arrival order, goes to the participant with the lowest key of
/// (finishes before it, finishes after it, next known finish time, previous
/// known finish time). Participants who already have a record for every
/// segment are not considered.
pub fn guess_bibs(mut raw: RawResults, entries: &Entries, segments: usize) -> RawResults {
    let unknown: Vec<usize> = raw
        .records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| record.bib.is_none().then_some(index))
        .collect();
    if unknown.is_empty() {
        return raw;
    }

    let expected = entries.len() * segments;
    let recorded = raw.records.len();
    if recorded != expected {
        tracing::warn!(recorded, expected, "not guessing missing bib numbers");
        let note = format!(
            "bib number not guessed: {recorded} results recorded, {expected} expected"
        );
        for &index in &unknown {
            raw.records[index].annotate(note.clone());
        }
        return raw;
    }

    for position in unknown {
        let best = entries
            .iter()
            .map(|entry| guess_key(&raw, position, entry.bib))
            .filter(|key| key.finishes_before + key.finishes_after < segments)
            .min();
        if let Some(key) = best {
            let record = &mut raw.records[position];
            tracing::warn!(bib = %key.bib, line = record.line, "guessed missing bib number");
            record.bib = Some(key.bib);
            record.annotate(NOTE_BIB_GUESSED);
        }
    }

    raw
}
