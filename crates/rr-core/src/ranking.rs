//! Ranking and tie-breaking.
//!
//! Standings are sorted by a chain of comparators; the first comparator that
//! distinguishes two results decides their order. Positions are then
//! numbered, with results that share a place shown as e.g. `3=`.

use std::cmp::Ordering;

use serde::Serialize;

use crate::entry::{Entries, name_key};
use crate::race::Race;
use crate::resolution::{Resolved, SegmentResult};
use crate::time::{Performance, RaceTime};
use crate::types::{Bib, CategoryCode};

/// A participant's place in the overall standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallResult {
    /// Empty for non-finishers.
    pub position: String,
    pub bib: Bib,
    pub name: String,
    pub club: String,
    pub category: CategoryCode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub runners: Vec<String>,
    pub performance: Performance,
    pub segments: Vec<SegmentResult>,
    /// Prize categories won, in award order.
    pub prizes: Vec<CategoryCode>,
}

impl OverallResult {
    pub const fn completed(&self) -> bool {
        self.performance.is_finished()
    }

    /// Arrival index of the record that completed the final segment.
    pub fn final_arrival(&self) -> Option<usize> {
        self.segments.last().and_then(|segment| segment.arrival)
    }

    pub fn name_key(&self) -> (&str, &str) {
        name_key(&self.name)
    }
}

/// A comparison step in a sort chain.
pub type Comparator<T> = fn(&T, &T) -> Ordering;

/// Applies comparators in order until one of them tells `a` and `b` apart.
pub fn compare_chain<T>(comparators: &[Comparator<T>], a: &T, b: &T) -> Ordering {
    comparators
        .iter()
        .map(|compare| compare(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Finishers first; non-finishers among themselves by ascending bib.
pub fn by_completion(a: &OverallResult, b: &OverallResult) -> Ordering {
    match (a.completed(), b.completed()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.bib.cmp(&b.bib),
    }
}

pub fn by_performance(a: &OverallResult, b: &OverallResult) -> Ordering {
    a.performance.cmp(&b.performance)
}

/// Earlier arrival in the final segment first, between finishers with the
/// same total only.
pub fn by_final_arrival(a: &OverallResult, b: &OverallResult) -> Ordering {
    if a.completed() && b.completed() && a.performance == b.performance {
        a.final_arrival().cmp(&b.final_arrival())
    } else {
        Ordering::Equal
    }
}

pub fn by_name(a: &OverallResult, b: &OverallResult) -> Ordering {
    a.name_key().cmp(&b.name_key())
}

pub const OVERALL_COMPARATORS: &[Comparator<OverallResult>] =
    &[by_completion, by_performance, by_final_arrival, by_name];

/// Numbers sorted results, giving consecutive results that `share` a place
/// the same position suffixed with `=`.
///
/// Results for which `placed` is false get an empty position.
fn assign_positions<T>(
    results: &[T],
    placed: impl Fn(&T) -> bool,
    share: impl Fn(&T, &T) -> bool,
) -> Vec<String> {
    let mut positions = vec![String::new(); results.len()];
    let mut index = 0;
    while index < results.len() {
        if !placed(&results[index]) {
            index += 1;
            continue;
        }
        let mut end = index + 1;
        while end < results.len()
            && placed(&results[end])
            && share(&results[end - 1], &results[end])
        {
            end += 1;
        }
        let label = if end - index > 1 {
            format!("{}=", index + 1)
        } else {
            (index + 1).to_string()
        };
        for position in &mut positions[index..end] {
            position.clone_from(&label);
        }
        index = end;
    }
    positions
}

/// Builds and orders the overall standings.
///
/// Equal totals are split by final-segment arrival unless the bibs are
/// declared a dead heat, in which case they share the place.
pub fn rank(race: &Race, entries: &Entries, resolved: Vec<Resolved>) -> Vec<OverallResult> {
    let mut results: Vec<OverallResult> = resolved
        .into_iter()
        .filter_map(|participant| {
            let entry = entries.get(participant.bib)?;
            Some(OverallResult {
                position: String::new(),
                bib: entry.bib,
                name: entry.name.clone(),
                club: entry.club.clone(),
                category: entry.category.clone(),
                runners: entry.runners.clone(),
                performance: participant.performance,
                segments: participant.segments,
                prizes: Vec::new(),
            })
        })
        .collect();

    results.sort_by(|a, b| compare_chain(OVERALL_COMPARATORS, a, b));

    let positions = assign_positions(&results, OverallResult::completed, |a, b| {
        a.performance == b.performance && race.declared_dead_heat(a.bib, b.bib)
    });
    for (result, position) in results.iter_mut().zip(positions) {
        result.position = position;
    }

    tracing::debug!(results = results.len(), "ranked overall standings");
    results
}

/// One runner's result for a single leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegResult {
    pub position: String,
    pub bib: Bib,
    /// The leg's runner when known, otherwise the entry name.
    pub name: String,
    pub team: String,
    pub category: CategoryCode,
    pub start: RaceTime,
    pub finish: RaceTime,
    pub duration: RaceTime,
    pub in_mass_start: bool,
}

fn by_duration(a: &LegResult, b: &LegResult) -> Ordering {
    a.duration.cmp(&b.duration)
}

fn by_runner_name(a: &LegResult, b: &LegResult) -> Ordering {
    name_key(&a.name).cmp(&name_key(&b.name))
}

const LEG_COMPARATORS: &[Comparator<LegResult>] = &[by_duration, by_runner_name];

/// Standings for one segment: everyone who completed it, fastest first.
/// Equal durations share a place.
pub fn leg_standings(results: &[OverallResult], segment: usize) -> Vec<LegResult> {
    let mut legs: Vec<LegResult> = results
        .iter()
        .filter_map(|result| {
            let row = result.segments.get(segment).filter(|row| !row.dnf)?;
            Some(LegResult {
                position: String::new(),
                bib: result.bib,
                name: result
                    .runners
                    .get(segment)
                    .unwrap_or(&result.name)
                    .clone(),
                team: result.name.clone(),
                category: result.category.clone(),
                start: row.start?,
                finish: row.finish?,
                duration: row.duration?,
                in_mass_start: row.in_mass_start,
            })
        })
        .collect();

    legs.sort_by(|a, b| compare_chain(LEG_COMPARATORS, a, b));
    let positions = assign_positions(&legs, |_| true, |a, b| a.duration == b.duration);
    for (leg, position) in legs.iter_mut().zip(positions) {
        leg.position = position;
    }
    legs
}
