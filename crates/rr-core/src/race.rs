//! Race configuration.
//!
//! Race variants are described by a [`RaceFormat`] tag plus the timing rules
//! in [`Race`]; the engine's stages are free functions parameterised by it.
//! Segment (leg) indices are 0-based throughout; errors report legs 1-based.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::category::CategoryRegistry;
use crate::entry::Entries;
use crate::error::ConfigurationError;
use crate::time::RaceTime;
use crate::types::{Bib, CategoryCode};

/// The kind of race being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RaceFormat {
    /// One runner, one segment, common start.
    Individual,
    /// Teams running `legs` consecutive segments.
    Relay { legs: usize },
    /// One segment with runners started in waves, in ascending bib order.
    TimeTrial {
        wave_interval: RaceTime,
        runners_per_wave: usize,
    },
}

impl RaceFormat {
    /// Number of timed segments per participant.
    pub const fn segments(self) -> usize {
        match self {
            Self::Individual | Self::TimeTrial { .. } => 1,
            Self::Relay { legs } => legs,
        }
    }
}

/// The fixed configuration of one race.
#[derive(Debug, Clone)]
pub struct Race {
    pub name: String,

    pub format: RaceFormat,

    /// Added to every participant's first-segment start.
    pub start_offset: RaceTime,

    /// Mass start time per segment index. Segments without an entry have no
    /// mass start of their own.
    pub mass_starts: BTreeMap<usize, RaceTime>,

    /// Start offset per entry category, added to the first-segment start.
    pub category_offsets: BTreeMap<CategoryCode, RaceTime>,

    /// Explicit start times for (bib, segment) pairs.
    pub start_overrides: BTreeMap<(Bib, usize), RaceTime>,

    /// (bib, segment) pairs declared did-not-finish.
    pub dnf: BTreeSet<(Bib, usize)>,

    /// Groups of bibs declared to have dead-heated in the overall standings.
    pub dead_heats: Vec<BTreeSet<Bib>>,

    pub categories: CategoryRegistry,
}

impl Race {
    /// A race with no mass starts, offsets, overrides or declarations.
    pub fn new(name: impl Into<String>, format: RaceFormat, categories: CategoryRegistry) -> Self {
        Self {
            name: name.into(),
            format,
            start_offset: RaceTime::zero(),
            mass_starts: BTreeMap::new(),
            category_offsets: BTreeMap::new(),
            start_overrides: BTreeMap::new(),
            dnf: BTreeSet::new(),
            dead_heats: Vec::new(),
            categories,
        }
    }

    pub const fn segments(&self) -> usize {
        self.format.segments()
    }

    /// The mass start that applies to `segment`.
    ///
    /// A segment without its own mass start inherits the next configured one,
    /// so a runner still out on an earlier leg is caught by a later mass start.
    pub fn effective_mass_start(&self, segment: usize) -> Option<RaceTime> {
        self.mass_starts.range(segment..).next().map(|(_, &time)| time)
    }

    /// Whether the two bibs are declared to share a place.
    pub fn declared_dead_heat(&self, a: Bib, b: Bib) -> bool {
        self.dead_heats
            .iter()
            .any(|group| group.contains(&a) && group.contains(&b))
    }

    /// Checks settings that do not depend on the entries.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let segments = self.segments();
        if segments == 0 {
            return Err(ConfigurationError::NoSegments);
        }

        if let RaceFormat::TimeTrial {
            wave_interval,
            runners_per_wave,
        } = self.format
        {
            if runners_per_wave == 0 || wave_interval <= RaceTime::zero() {
                return Err(ConfigurationError::InvalidWaves);
            }
        }

        let mut previous: Option<(usize, RaceTime)> = None;
        for (&segment, &time) in &self.mass_starts {
            if segment == 0 {
                return Err(ConfigurationError::MassStartOnFirstLeg);
            }
            check_leg("mass start", segment, segments)?;
            if let Some((previous_segment, previous_time)) = previous {
                if time < previous_time {
                    return Err(ConfigurationError::MassStartsOutOfOrder {
                        leg: segment + 1,
                        time,
                        previous_leg: previous_segment + 1,
                        previous: previous_time,
                    });
                }
            }
            previous = Some((segment, time));
        }

        for code in self.category_offsets.keys() {
            if self.categories.entry_category(code.as_str()).is_none() {
                return Err(ConfigurationError::UnknownCategory {
                    setting: "category offset",
                    code: code.clone(),
                });
            }
        }

        for &(_, segment) in self.start_overrides.keys() {
            check_leg("start override", segment, segments)?;
        }
        for &(_, segment) in &self.dnf {
            check_leg("DNF declaration", segment, segments)?;
        }

        if self.dead_heats.iter().any(|group| group.len() < 2) {
            return Err(ConfigurationError::DeadHeatTooSmall);
        }

        Ok(())
    }

    /// Checks that every bib named in the configuration has an entry.
    pub fn validate_bibs(&self, entries: &Entries) -> Result<(), ConfigurationError> {
        let known = |setting: &'static str, bib: Bib| {
            if entries.get(bib).is_some() {
                Ok(())
            } else {
                Err(ConfigurationError::UnknownBib { setting, bib })
            }
        };
        for &(bib, _) in self.start_overrides.keys() {
            known("start override", bib)?;
        }
        for &(bib, _) in &self.dnf {
            known("DNF declaration", bib)?;
        }
        for &bib in self.dead_heats.iter().flatten() {
            known("dead heat declaration", bib)?;
        }
        Ok(())
    }
}

fn check_leg(
    setting: &'static str,
    segment: usize,
    segments: usize,
) -> Result<(), ConfigurationError> {
    if segment >= segments {
        return Err(ConfigurationError::LegOutOfRange {
            setting,
            leg: segment + 1,
            segments,
        });
    }
    Ok(())
}
