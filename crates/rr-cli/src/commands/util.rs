//! Shared utilities for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rr_core::{Entries, Race, RaceResults, TimingFeed, TimingFeeds, compute, parse_entries};

use crate::RaceFile;

/// A race definition with every file it refers to read into memory.
#[derive(Debug)]
pub struct RaceInput {
    pub path: PathBuf,
    pub race: Race,
    pub entries: Entries,
    results_name: String,
    results: String,
    paper: Option<(String, String)>,
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Name used for a feed in error messages and notes.
fn feed_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

impl RaceInput {
    /// Reads and validates a race definition and its entries.
    pub fn load(path: &Path, config_path: Option<&Path>) -> Result<Self> {
        let text = read(path)?;
        let file = RaceFile::load(path, &text, config_path)
            .with_context(|| format!("failed to load race definition {}", path.display()))?;
        tracing::debug!(?file, "loaded race definition");

        let race = file
            .to_race()
            .with_context(|| format!("invalid race definition {}", path.display()))?;

        let entries_name = feed_name(&file.entries);
        let entries = parse_entries(&entries_name, &read(&file.entries)?)
            .and_then(|parsed| Entries::new(&entries_name, parsed, &race.categories, race.segments()))
            .with_context(|| format!("invalid entries in {}", file.entries.display()))?;

        let paper = match &file.paper_results {
            Some(paper) => Some((feed_name(paper), read(paper)?)),
            None => None,
        };

        Ok(Self {
            path: path.to_path_buf(),
            race,
            entries,
            results_name: feed_name(&file.results),
            results: read(&file.results)?,
            paper,
        })
    }

    /// Runs the results computation.
    pub fn compute(&self) -> Result<RaceResults> {
        let feeds = TimingFeeds {
            primary: TimingFeed {
                name: &self.results_name,
                text: &self.results,
            },
            secondary: self
                .paper
                .as_ref()
                .map(|(name, text)| TimingFeed { name, text }),
        };
        compute(&self.race, &self.entries, feeds)
            .with_context(|| format!("failed to compute results for {}", self.path.display()))
    }
}

/// Loads and computes a race in one step.
pub fn load_results(path: &Path, config_path: Option<&Path>) -> Result<RaceResults> {
    RaceInput::load(path, config_path)?.compute()
}
