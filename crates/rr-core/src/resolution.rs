//! Time resolution.
//!
//! Turns the recovered finish records into per-segment start, finish and
//! duration for every participant. Records are matched to segments in
//! arrival order: a bib's first record fills its first segment, the second
//! record its second segment, and so on.
//!
//! A segment starts at the previous segment's finish, unless a mass start
//! for that segment (or the next segment that has one) is earlier, in which
//! case the runner started in the mass start.

use serde::Serialize;

use crate::entry::{Entries, Entry};
use crate::error::ConsistencyError;
use crate::ingest::RawResults;
use crate::race::{Race, RaceFormat};
use crate::time::{Performance, RaceTime};
use crate::types::Bib;

/// One participant's timing for one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentResult {
    pub start: Option<RaceTime>,
    pub finish: Option<RaceTime>,
    pub dnf: bool,
    pub in_mass_start: bool,

    /// Index of the raw record that filled this segment.
    pub arrival: Option<usize>,

    pub duration: Option<RaceTime>,

    /// Sum of durations up to and including this segment, while every
    /// segment so far has been completed.
    pub running_total: Option<RaceTime>,
}

impl SegmentResult {
    const fn unfilled() -> Self {
        Self {
            start: None,
            finish: None,
            dnf: true,
            in_mass_start: false,
            arrival: None,
            duration: None,
            running_total: None,
        }
    }
}

/// The resolved timing of one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub bib: Bib,
    pub performance: Performance,
    pub segments: Vec<SegmentResult>,
}

/// Resolved participants in entry order, plus notes about skipped data.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub participants: Vec<Resolved>,

    /// Participants left out of `participants` because their recorded
    /// times contradict their starts.
    pub conflicts: Vec<ConsistencyError>,

    pub notes: Vec<String>,
}

/// Wave start offset per entry index for time trials; zero otherwise.
#[expect(
    clippy::cast_possible_wrap,
    reason = "wave numbers are far below i64::MAX"
)]
fn wave_offsets(race: &Race, entries: &Entries) -> Vec<RaceTime> {
    let mut offsets = vec![RaceTime::zero(); entries.len()];
    if let RaceFormat::TimeTrial {
        wave_interval,
        runners_per_wave,
    } = race.format
    {
        let mut order: Vec<(usize, Bib)> = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (index, entry.bib))
            .collect();
        order.sort_by_key(|&(_, bib)| bib);
        for (position, (index, _)) in order.into_iter().enumerate() {
            let wave = position / runners_per_wave.max(1);
            offsets[index] = wave_interval * wave as i64;
        }
    }
    offsets
}

fn first_segment_start(race: &Race, entry: &Entry, wave_offset: RaceTime) -> RaceTime {
    let category_offset = race
        .category_offsets
        .get(&entry.category)
        .copied()
        .unwrap_or_else(RaceTime::zero);
    race.start_offset + category_offset + wave_offset
}

/// Start time and in-mass-start flag for a segment after the first.
fn chained_start(
    race: &Race,
    segment: usize,
    previous_finish: Option<RaceTime>,
) -> (Option<RaceTime>, bool) {
    let Some(previous) = previous_finish else {
        return (None, race.mass_starts.contains_key(&segment));
    };
    match race.effective_mass_start(segment) {
        Some(mass) if mass < previous => (Some(mass), true),
        _ => (Some(previous), false),
    }
}

/// Resolves every participant's segments from the recovered records.
///
/// Records whose bib is still unknown cannot be attributed and are skipped
/// with a note. A participant with a finish earlier than its start is left
/// out of the resolution and noted; everyone else is still resolved.
pub fn resolve_times(race: &Race, entries: &Entries, raw: &RawResults) -> Resolution {
    let segments = race.segments();
    let mut table = vec![vec![SegmentResult::unfilled(); segments]; entries.len()];
    let mut filled = vec![0_usize; entries.len()];
    let mut notes = Vec::new();

    for (arrival, record) in raw.records.iter().enumerate() {
        let Some(bib) = record.bib else {
            let time = record
                .finish
                .map_or_else(|| "unknown time".to_string(), |t| t.to_string());
            notes.push(format!(
                "{} line {}: result at {time} has no bib number and was skipped",
                raw.feed_name(record.source),
                record.line
            ));
            continue;
        };
        let Some(index) = entries.index_of(bib) else {
            continue;
        };
        let Some(segment) = table[index].get_mut(filled[index]) else {
            continue;
        };
        segment.finish = record.finish;
        segment.arrival = Some(arrival);
        filled[index] += 1;
    }

    let waves = wave_offsets(race, entries);
    let mut participants = Vec::with_capacity(entries.len());
    let mut conflicts = Vec::new();

    for ((index, entry), mut rows) in entries.iter().enumerate().zip(table) {
        let bib = entry.bib;
        let mut previous_finish = None;
        let mut running = Some(RaceTime::zero());
        let mut conflict = None;

        for (s, row) in rows.iter_mut().enumerate() {
            let (start, in_mass_start) = if let Some(&time) = race.start_overrides.get(&(bib, s)) {
                (Some(time), false)
            } else if s == 0 {
                (Some(first_segment_start(race, entry, waves[index])), false)
            } else {
                chained_start(race, s, previous_finish)
            };
            row.start = start;
            row.in_mass_start = in_mass_start;

            if let (Some(start), Some(finish)) = (row.start, row.finish) {
                if finish >= start {
                    row.duration = Some(finish - start);
                } else if conflict.is_none() {
                    conflict = Some(ConsistencyError::FinishBeforeStart {
                        bib,
                        leg: s + 1,
                        start,
                        finish,
                    });
                }
            }

            let declared = race.dnf.contains(&(bib, s));
            if declared {
                if let Some(finish) = row.finish {
                    notes.push(format!(
                        "bib {bib} leg {}: declared DNF, recorded finish {finish} not counted",
                        s + 1
                    ));
                }
            }
            row.dnf = declared || row.duration.is_none();

            running = match (running, row.duration) {
                (Some(total), Some(duration)) if !row.dnf => Some(total + duration),
                _ => None,
            };
            row.running_total = running;

            previous_finish = row.finish;
        }

        if let Some(error) = conflict {
            tracing::warn!(%bib, "finish earlier than start, participant excluded");
            notes.push(format!("{error}; excluded from results"));
            conflicts.push(error);
            continue;
        }

        let performance = if filled[index] == 0 {
            Performance::DidNotStart
        } else if rows.iter().all(|row| !row.dnf) {
            Performance::Finished(rows.iter().filter_map(|row| row.duration).sum())
        } else {
            Performance::DidNotFinish
        };

        participants.push(Resolved {
            bib,
            performance,
            segments: rows,
        });
    }

    tracing::debug!(participants = participants.len(), "resolved segment times");
    Resolution {
        participants,
        conflicts,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::entry::parse_entries;
    use crate::ingest::{TimingFeed, ingest};
    use crate::race::tests::{bib, registry};
    use crate::types::CategoryCode;

    fn race(format: RaceFormat) -> Race {
        Race::new("Test", format, registry())
    }

    fn entries(race: &Race, bibs: &[u32]) -> Entries {
        let text: String = bibs
            .iter()
            .map(|bib| format!("{bib}\tRunner {bib}\tClub\tO\n"))
            .collect();
        Entries::new(
            "entries",
            parse_entries("entries", &text).unwrap(),
            &race.categories,
            race.segments(),
        )
        .unwrap()
    }

    fn resolve(race: &Race, bibs: &[u32], results: &str) -> Resolution {
        let raw = ingest(
            TimingFeed {
                name: "results",
                text: results,
            },
            None,
        )
        .unwrap();
        resolve_times(race, &entries(race, bibs), &raw)
    }

    fn t(s: &str) -> RaceTime {
        s.parse().unwrap()
    }

    #[test]
    fn single_individual_finisher() {
        let race = race(RaceFormat::Individual);
        let resolution = resolve(&race, &[101], "101\t0:10:00\n");
        let result = &resolution.participants[0];
        assert_eq!(result.performance, Performance::Finished(t("0:10:00")));
        assert_eq!(result.segments[0].start, Some(RaceTime::zero()));
        assert_eq!(result.segments[0].duration, Some(t("0:10:00")));
        assert_eq!(result.segments[0].arrival, Some(0));
        assert!(resolution.notes.is_empty());
    }

    #[test]
    fn entry_without_records_did_not_start() {
        let race = race(RaceFormat::Individual);
        let resolution = resolve(&race, &[1, 2], "1\t0:10:00\n");
        assert_eq!(resolution.participants[1].performance, Performance::DidNotStart);
        assert!(resolution.participants[1].segments[0].dnf);
    }

    #[test]
    fn relay_legs_chain_from_previous_finish() {
        let race = race(RaceFormat::Relay { legs: 3 });
        let resolution = resolve(
            &race,
            &[1],
            "1\t0:20:00\n1\t0:45:00\n1\t1:05:30\n",
        );
        let rows = &resolution.participants[0].segments;
        assert_eq!(rows[1].start, Some(t("0:20:00")));
        assert_eq!(rows[2].start, Some(t("0:45:00")));
        assert_eq!(rows[2].duration, Some(t("0:20:30")));
        assert_eq!(rows[1].running_total, Some(t("0:45:00")));
        assert_eq!(rows[2].running_total, Some(t("1:05:30")));
        assert_eq!(
            resolution.participants[0].performance,
            Performance::Finished(t("1:05:30"))
        );
    }

    #[test]
    fn start_is_earlier_of_previous_finish_and_mass_start() {
        let mut race = race(RaceFormat::Relay { legs: 3 });
        race.mass_starts.insert(2, t("1:00:00"));
        let resolution = resolve(
            &race,
            &[1, 2],
            "1\t0:20:00\n2\t0:30:00\n1\t0:50:00\n2\t1:05:00\n1\t1:10:00\n2\t1:25:00\n",
        );

        let fast = &resolution.participants[0].segments;
        assert_eq!(fast[2].start, Some(t("0:50:00")));
        assert!(!fast[2].in_mass_start);

        let slow = &resolution.participants[1].segments;
        assert_eq!(slow[2].start, Some(t("1:00:00")));
        assert!(slow[2].in_mass_start);
        assert_eq!(slow[2].duration, Some(t("0:25:00")));

        for participant in &resolution.participants {
            for s in 1..3 {
                let previous = participant.segments[s - 1].finish.unwrap();
                let expected = race
                    .effective_mass_start(s)
                    .map_or(previous, |mass| mass.min(previous));
                assert_eq!(participant.segments[s].start, Some(expected));
            }
        }
    }

    #[test]
    fn later_mass_start_applies_to_earlier_leg() {
        let mut race = race(RaceFormat::Relay { legs: 3 });
        race.mass_starts.insert(2, t("1:00:00"));
        let resolution = resolve(&race, &[1], "1\t1:10:00\n1\t1:30:00\n1\t1:50:00\n");
        let rows = &resolution.participants[0].segments;
        assert_eq!(rows[1].start, Some(t("1:00:00")));
        assert!(rows[1].in_mass_start);
    }

    #[test]
    fn missing_previous_finish_leaves_start_unset() {
        let mut race = race(RaceFormat::Relay { legs: 2 });
        race.mass_starts.insert(1, t("1:00:00"));
        let resolution = resolve(&race, &[1, 2], "2\t0:30:00\n2\t0:50:00\n");
        let rows = &resolution.participants[0].segments;
        assert_eq!(rows[1].start, None);
        assert!(rows[1].in_mass_start);
        assert!(rows[1].dnf);
        assert!(!rows[0].in_mass_start);
    }

    #[test]
    fn override_is_used_verbatim() {
        let mut race = race(RaceFormat::Relay { legs: 2 });
        race.mass_starts.insert(1, t("0:30:00"));
        race.start_overrides.insert((bib(1), 1), t("0:42:00"));
        let resolution = resolve(&race, &[1], "1\t0:40:00\n1\t1:00:00\n");
        let rows = &resolution.participants[0].segments;
        assert_eq!(rows[1].start, Some(t("0:42:00")));
        assert!(!rows[1].in_mass_start);
        assert_eq!(rows[1].duration, Some(t("0:18:00")));
    }

    #[test]
    fn category_and_global_offsets_shift_first_start() {
        let mut race = race(RaceFormat::Individual);
        race.start_offset = t("-0:01:00");
        race.category_offsets
            .insert(CategoryCode::new("O").unwrap(), t("0:05:00"));
        let resolution = resolve(&race, &[1], "1\t0:30:00\n");
        assert_eq!(resolution.participants[0].segments[0].start, Some(t("0:04:00")));
        assert_eq!(
            resolution.participants[0].performance,
            Performance::Finished(t("0:26:00"))
        );
    }

    #[test]
    fn time_trial_waves_follow_ascending_bib_order() {
        let race = race(RaceFormat::TimeTrial {
            wave_interval: t("0:01:00"),
            runners_per_wave: 2,
        });
        let resolution = resolve(
            &race,
            &[30, 10, 20, 40, 50],
            "10\t0:10:00\n20\t0:10:30\n30\t0:11:00\n40\t0:11:30\n50\t0:12:00\n",
        );
        let starts: Vec<_> = resolution
            .participants
            .iter()
            .map(|p| p.segments[0].start.unwrap().to_string())
            .collect();
        assert_eq!(starts, ["0:01:00", "0:00:00", "0:00:00", "0:01:00", "0:02:00"]);
    }

    #[test]
    fn finish_before_start_excludes_only_that_participant() {
        let mut race = race(RaceFormat::Individual);
        race.category_offsets
            .insert(CategoryCode::new("O").unwrap(), t("0:15:00"));
        race.start_overrides.insert((bib(8), 0), RaceTime::zero());
        let resolution = resolve(&race, &[7, 8], "7\t0:10:00\n8\t0:12:00\n");

        assert_eq!(
            resolution.conflicts,
            [ConsistencyError::FinishBeforeStart {
                bib: bib(7),
                leg: 1,
                start: t("0:15:00"),
                finish: t("0:10:00"),
            }]
        );
        assert_eq!(resolution.participants.len(), 1);
        assert_eq!(resolution.participants[0].bib, bib(8));
        assert_eq!(
            resolution.participants[0].performance,
            Performance::Finished(t("0:12:00"))
        );
        assert_eq!(
            resolution.notes,
            ["bib 7 leg 1: finish 0:10:00 is earlier than start 0:15:00; excluded from results"]
        );
    }

    #[test]
    fn declared_dnf_still_chains_into_next_leg() {
        let mut race = race(RaceFormat::Relay { legs: 2 });
        race.dnf.insert((bib(1), 0));
        let resolution = resolve(&race, &[1], "1\t0:20:00\n1\t0:45:00\n");
        let result = &resolution.participants[0];
        assert!(result.segments[0].dnf);
        assert_eq!(result.segments[1].start, Some(t("0:20:00")));
        assert_eq!(result.segments[1].duration, Some(t("0:25:00")));
        assert_eq!(result.segments[1].running_total, None);
        assert_eq!(result.performance, Performance::DidNotFinish);
        assert_eq!(
            resolution.notes,
            ["bib 1 leg 1: declared DNF, recorded finish 0:20:00 not counted"]
        );
    }

    #[test]
    fn unknown_bib_records_are_skipped_with_note() {
        let race = race(RaceFormat::Individual);
        let resolution = resolve(&race, &[1, 2, 3], "1\t0:10:00\n?\t0:11:00\n");
        assert_eq!(
            resolution.notes,
            ["results line 2: result at 0:11:00 has no bib number and was skipped"]
        );
        let dns: BTreeSet<_> = resolution
            .participants
            .iter()
            .filter(|p| p.performance == Performance::DidNotStart)
            .map(|p| p.bib.value())
            .collect();
        assert_eq!(dns, BTreeSet::from([2, 3]));
    }

    #[test]
    fn record_without_time_is_a_non_finish() {
        let race = race(RaceFormat::Individual);
        let resolution = resolve(&race, &[1], "1\t?\n");
        assert_eq!(resolution.participants[0].performance, Performance::DidNotFinish);
        assert_eq!(resolution.participants[0].segments[0].arrival, Some(0));
    }
}
