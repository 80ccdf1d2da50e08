//! Race definition loading.
//!
//! A race is described by a TOML file. Values are layered, later sources
//! overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. the user's global config (`~/.config/rr/config.toml`) or `--config`
//! 3. the race file itself
//! 4. `RR_`-prefixed environment variables
//!
//! Legs are numbered from 1 in the file and converted to 0-based segments
//! when building a [`Race`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use rr_core::{
    Bib, CategoryCode, CategoryRegistry, ConfigurationError, EntryCategory, PrizeCategory, Race,
    RaceFormat, RaceTime,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MassStart {
    pub leg: usize,
    pub time: RaceTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOverride {
    pub bib: Bib,
    pub leg: usize,
    pub time: RaceTime,
}

/// A (bib, leg) pair declared did-not-finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegDeclaration {
    pub bib: Bib,
    pub leg: usize,
}

/// The contents of a race definition file.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceFile {
    pub name: String,
    pub format: RaceFormat,

    /// Entries feed, relative to the race file.
    pub entries: PathBuf,
    /// Primary timing feed, relative to the race file.
    pub results: PathBuf,
    /// Backup timing feed, appended after the primary one.
    pub paper_results: Option<PathBuf>,

    pub start_offset: RaceTime,
    pub mass_starts: Vec<MassStart>,
    pub category_offsets: BTreeMap<CategoryCode, RaceTime>,
    pub start_overrides: Vec<StartOverride>,
    pub dnf: Vec<LegDeclaration>,
    pub dead_heats: Vec<Vec<Bib>>,

    pub gender_inclusions: BTreeMap<String, BTreeSet<String>>,
    pub entry_categories: Vec<EntryCategory>,
    pub prize_categories: Vec<PrizeCategory>,
    pub prize_allocation_order: Vec<CategoryCode>,
}

impl fmt::Debug for RaceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaceFile")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("entries", &self.entries)
            .field("results", &self.results)
            .field("paper_results", &self.paper_results)
            .field("entry_categories", &self.entry_categories.len())
            .field("prize_categories", &self.prize_categories.len())
            .finish_non_exhaustive()
    }
}

impl Default for RaceFile {
    fn default() -> Self {
        Self {
            name: "Race".to_string(),
            format: RaceFormat::Individual,
            entries: PathBuf::from("entries.tsv"),
            results: PathBuf::from("results.tsv"),
            paper_results: None,
            start_offset: RaceTime::zero(),
            mass_starts: Vec::new(),
            category_offsets: BTreeMap::new(),
            start_overrides: Vec::new(),
            dnf: Vec::new(),
            dead_heats: Vec::new(),
            gender_inclusions: BTreeMap::new(),
            entry_categories: Vec::new(),
            prize_categories: Vec::new(),
            prize_allocation_order: Vec::new(),
        }
    }
}

impl RaceFile {
    /// Loads a race definition from `race_toml`, the text of the race file
    /// found at `path`.
    ///
    /// Feed paths in the result are resolved against the race file's
    /// directory.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load(
        path: &Path,
        race_toml: &str,
        config_path: Option<&Path>,
    ) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Global defaults, or the file given with --config
        match config_path {
            Some(config) => figment = figment.merge(Toml::file(config)),
            None => {
                if let Some(config_dir) = dirs_config_path() {
                    figment = figment.merge(Toml::file(config_dir.join("config.toml")));
                }
            }
        }

        figment = figment.merge(Toml::string(race_toml));

        // Load from environment variables (RR_*)
        figment = figment.merge(Env::prefixed("RR_"));

        let mut file: Self = figment.extract()?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        file.entries = base.join(&file.entries);
        file.results = base.join(&file.results);
        file.paper_results = file.paper_results.map(|paper| base.join(paper));
        Ok(file)
    }

    /// Builds the race configuration, converting 1-based legs.
    pub fn to_race(&self) -> Result<Race, ConfigurationError> {
        let categories = CategoryRegistry::new(
            self.entry_categories.clone(),
            self.prize_categories.clone(),
            self.gender_inclusions.clone(),
            &self.prize_allocation_order,
        )?;
        let segments = self.format.segments();
        let segment = |setting: &'static str, leg: usize| {
            leg.checked_sub(1)
                .ok_or(ConfigurationError::LegOutOfRange {
                    setting,
                    leg,
                    segments,
                })
        };

        let mut race = Race::new(self.name.clone(), self.format, categories);
        race.start_offset = self.start_offset;
        race.category_offsets.clone_from(&self.category_offsets);
        for mass in &self.mass_starts {
            race.mass_starts.insert(segment("mass start", mass.leg)?, mass.time);
        }
        for over in &self.start_overrides {
            race.start_overrides
                .insert((over.bib, segment("start override", over.leg)?), over.time);
        }
        for declared in &self.dnf {
            race.dnf
                .insert((declared.bib, segment("DNF declaration", declared.leg)?));
        }
        race.dead_heats = self
            .dead_heats
            .iter()
            .map(|group| group.iter().copied().collect())
            .collect();
        Ok(race)
    }
}

/// Returns the platform-specific config directory for rr.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("rr"))
}
