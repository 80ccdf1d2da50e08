//! Race entries.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::category::CategoryRegistry;
use crate::error::IngestionError;
use crate::types::{Bib, CategoryCode};

/// One registered participant: an individual runner or a relay team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub bib: Bib,

    /// Display name; unique within the race.
    pub name: String,

    pub club: String,

    pub category: CategoryCode,

    /// Runner names, one per leg, for relay teams. Empty otherwise.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub runners: Vec<String>,

    /// Source line in the entries feed.
    #[serde(skip)]
    pub line: usize,
}

impl Entry {
    /// Key for alphabetic ordering: surname, then the remaining names.
    ///
    /// The surname is taken to be the last word of the display name.
    pub fn name_key(&self) -> (&str, &str) {
        name_key(&self.name)
    }
}

/// Splits a display name into (surname, given names).
pub(crate) fn name_key(name: &str) -> (&str, &str) {
    let name = name.trim();
    match name.rsplit_once(char::is_whitespace) {
        Some((given, surname)) => (surname, given.trim_end()),
        None => (name, ""),
    }
}

/// Parses an entries feed.
///
/// Each non-blank line holds tab-separated fields: bib, name, club, category
/// code and, for relays, one runner name per leg. Text after `#` is a comment.
pub fn parse_entries(feed: &str, text: &str) -> Result<Vec<Entry>, IngestionError> {
    let mut entries = Vec::new();
    for (idx, raw_line) in text.lines().enumerate() {
        let line = idx + 1;
        let content = strip_comment(raw_line).trim();
        if content.is_empty() {
            continue;
        }
        let fields: Vec<&str> = content.split('\t').map(str::trim).collect();
        let malformed = |reason: String| IngestionError::Malformed {
            feed: feed.to_string(),
            line,
            reason,
        };
        if fields.len() < 4 {
            return Err(malformed(format!(
                "expected bib, name, club and category, found {} field(s)",
                fields.len()
            )));
        }
        let bib: Bib = fields[0].parse().map_err(|e| malformed(format!("{e}")))?;
        if fields[1].is_empty() {
            return Err(malformed("entry name is empty".to_string()));
        }
        let category = CategoryCode::new(fields[3]).map_err(|e| malformed(format!("{e}")))?;
        entries.push(Entry {
            bib,
            name: fields[1].to_string(),
            club: fields[2].to_string(),
            category,
            runners: fields[4..].iter().map(ToString::to_string).collect(),
            line,
        });
    }
    Ok(entries)
}

/// Returns the line with any `#` comment removed.
pub(crate) fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(content, _)| content)
}

/// The validated entries of one race, in feed order.
#[derive(Debug, Clone)]
pub struct Entries {
    entries: Vec<Entry>,
    by_bib: HashMap<Bib, usize>,
}

impl Entries {
    /// Validates entries against the race's categories and leg count.
    ///
    /// Bibs and names must be unique and every category code must resolve.
    /// When runner names are given, there must be one per leg.
    pub fn new(
        feed: &str,
        entries: Vec<Entry>,
        categories: &CategoryRegistry,
        segments: usize,
    ) -> Result<Self, IngestionError> {
        let mut by_bib = HashMap::with_capacity(entries.len());
        let mut names = HashSet::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if by_bib.insert(entry.bib, index).is_some() {
                return Err(IngestionError::DuplicateBib {
                    feed: feed.to_string(),
                    line: entry.line,
                    bib: entry.bib,
                });
            }
            if !names.insert(entry.name.clone()) {
                return Err(IngestionError::DuplicateName {
                    feed: feed.to_string(),
                    line: entry.line,
                    name: entry.name.clone(),
                });
            }
            if categories.entry_category(entry.category.as_str()).is_none() {
                return Err(IngestionError::UnknownCategory {
                    feed: feed.to_string(),
                    line: entry.line,
                    bib: entry.bib,
                    code: entry.category.to_string(),
                });
            }
            if !entry.runners.is_empty() && entry.runners.len() != segments {
                return Err(IngestionError::RunnerCount {
                    feed: feed.to_string(),
                    line: entry.line,
                    bib: entry.bib,
                    found: entry.runners.len(),
                    expected: segments,
                });
            }
        }
        Ok(Self { entries, by_bib })
    }

    pub fn get(&self, bib: Bib) -> Option<&Entry> {
        self.index_of(bib).map(|index| &self.entries[index])
    }

    /// Position of the entry with `bib` in feed order.
    pub fn index_of(&self, bib: Bib) -> Option<usize> {
        self.by_bib.get(&bib).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Entries {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
