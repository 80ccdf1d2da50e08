//! Entry and prize categories and the inclusion relation between them.
//!
//! A prize category *includes* an entry category when a participant entered
//! in the latter is eligible for the former's prizes. Inclusion combines a
//! gender rule with an age rule:
//!
//! - the genders are equal, or the prize gender is configured to include the
//!   entry gender (e.g. `Open` includes `Women` and `Mixed`);
//! - the entry's age band lies within the prize's age band.
//!
//! The relation is deliberately not closed under transitivity: configured
//! gender inclusions apply one step only.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::types::CategoryCode;

/// A category a participant enters in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCategory {
    /// Short code used in the entries feed.
    pub code: CategoryCode,

    /// Long display name.
    pub name: String,

    /// Gender or team composition tag (e.g. "Women", "Mixed").
    pub gender: String,

    #[serde(default)]
    pub min_age: u32,

    /// Inclusive upper age bound; unbounded when absent.
    #[serde(default)]
    pub max_age: Option<u32>,
}

/// A category prizes are awarded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeCategory {
    pub code: CategoryCode,

    pub name: String,

    pub gender: String,

    #[serde(default)]
    pub min_age: u32,

    #[serde(default)]
    pub max_age: Option<u32>,

    /// Number of places that receive a prize.
    pub prizes: usize,

    /// Winning an exclusive category rules a participant out of every other
    /// exclusive category.
    #[serde(default = "default_exclusive")]
    pub exclusive: bool,
}

const fn default_exclusive() -> bool {
    true
}

fn age_band_within(
    inner_min: u32,
    inner_max: Option<u32>,
    outer_min: u32,
    outer_max: Option<u32>,
) -> bool {
    let max_within = match (inner_max, outer_max) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(inner), Some(outer)) => inner <= outer,
    };
    inner_min >= outer_min && max_within
}

/// The categories of one race, fixed once constructed.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    entry_categories: Vec<EntryCategory>,
    entry_index: HashMap<CategoryCode, usize>,
    /// Prize categories in report order.
    prize_categories: Vec<PrizeCategory>,
    /// Indices into `prize_categories`, most general first.
    allocation_order: Vec<usize>,
    gender_inclusions: BTreeMap<String, BTreeSet<String>>,
}

impl CategoryRegistry {
    /// Builds a registry.
    ///
    /// `prize_categories` are given in report order. `allocation_order` lists
    /// every prize category code, most general first; when empty, report
    /// order is used for allocation too.
    pub fn new(
        entry_categories: Vec<EntryCategory>,
        prize_categories: Vec<PrizeCategory>,
        gender_inclusions: BTreeMap<String, BTreeSet<String>>,
        allocation_order: &[CategoryCode],
    ) -> Result<Self, ConfigurationError> {
        let mut entry_index = HashMap::new();
        for (index, category) in entry_categories.iter().enumerate() {
            if entry_index.insert(category.code.clone(), index).is_some() {
                return Err(ConfigurationError::DuplicateCategory {
                    kind: "entry",
                    code: category.code.clone(),
                });
            }
        }

        let mut prize_index = HashMap::new();
        for (index, category) in prize_categories.iter().enumerate() {
            if prize_index.insert(category.code.clone(), index).is_some() {
                return Err(ConfigurationError::DuplicateCategory {
                    kind: "prize",
                    code: category.code.clone(),
                });
            }
        }

        let allocation_order = if allocation_order.is_empty() {
            (0..prize_categories.len()).collect()
        } else {
            let mut seen = BTreeSet::new();
            let mut order = Vec::with_capacity(allocation_order.len());
            for code in allocation_order {
                let index = *prize_index.get(code).ok_or_else(|| {
                    ConfigurationError::UnknownCategory {
                        setting: "prize allocation order",
                        code: code.clone(),
                    }
                })?;
                if !seen.insert(index) {
                    return Err(ConfigurationError::RepeatedAllocation { code: code.clone() });
                }
                order.push(index);
            }
            if let Some(missing) = prize_categories
                .iter()
                .enumerate()
                .find(|(index, _)| !seen.contains(index))
            {
                return Err(ConfigurationError::IncompleteAllocation {
                    code: missing.1.code.clone(),
                });
            }
            order
        };

        Ok(Self {
            entry_categories,
            entry_index,
            prize_categories,
            allocation_order,
            gender_inclusions,
        })
    }

    /// Looks up an entry category by its short code.
    pub fn entry_category(&self, code: &str) -> Option<&EntryCategory> {
        self.entry_index
            .get(code)
            .map(|&index| &self.entry_categories[index])
    }

    pub fn entry_categories(&self) -> &[EntryCategory] {
        &self.entry_categories
    }

    /// Prize categories in report order.
    pub fn prize_categories(&self) -> &[PrizeCategory] {
        &self.prize_categories
    }

    /// Prize categories in allocation order, each with its report index.
    pub fn allocation_order(&self) -> impl Iterator<Item = (usize, &PrizeCategory)> + '_ {
        self.allocation_order
            .iter()
            .map(|&index| (index, &self.prize_categories[index]))
    }

    /// Whether a participant entered in `entry` is eligible for `prize`.
    pub fn includes(&self, prize: &PrizeCategory, entry: &EntryCategory) -> bool {
        let gender_eligible = prize.gender == entry.gender
            || self
                .gender_inclusions
                .get(&prize.gender)
                .is_some_and(|included| included.contains(&entry.gender));

        gender_eligible && age_band_within(entry.min_age, entry.max_age, prize.min_age, prize.max_age)
    }

    /// Whether any prize category includes `entry`.
    pub fn has_prize_for(&self, entry: &EntryCategory) -> bool {
        self.prize_categories
            .iter()
            .any(|prize| self.includes(prize, entry))
    }
}
