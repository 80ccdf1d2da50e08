//! Prize allocation.
//!
//! Prize categories are visited most general first, in two passes: the first
//! pass awards only first place in each category, the second fills the
//! remaining places. A participant who wins an exclusive category cannot win
//! another exclusive one, so the first pass lets every category claim its
//! winner before the lesser places are handed out.

use serde::Serialize;

use crate::category::{CategoryRegistry, PrizeCategory};
use crate::ranking::OverallResult;
use crate::types::{Bib, CategoryCode};

/// The winners of one prize category, in award order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeList {
    pub category: CategoryCode,
    pub name: String,
    pub winners: Vec<Bib>,
}

fn eligible(
    result: &OverallResult,
    prize: &PrizeCategory,
    registry: &CategoryRegistry,
    won_exclusive: bool,
) -> bool {
    result.completed()
        && !(prize.exclusive && won_exclusive)
        && registry
            .entry_category(result.category.as_str())
            .is_some_and(|entry| registry.includes(prize, entry))
}

struct Allocation<'a> {
    registry: &'a CategoryRegistry,
    results: Vec<OverallResult>,
    /// Result indices per prize category, in report order.
    winners: Vec<Vec<usize>>,
    won_exclusive: Vec<bool>,
}

impl Allocation<'_> {
    /// Awards the next place in `prize` to the best eligible result that has
    /// not already won it. Returns false when nobody is left.
    fn award_next(&mut self, report: usize, prize: &PrizeCategory) -> bool {
        let found = self.results.iter().enumerate().position(|(index, result)| {
            !self.winners[report].contains(&index)
                && eligible(result, prize, self.registry, self.won_exclusive[index])
        });
        let Some(index) = found else {
            return false;
        };
        self.winners[report].push(index);
        if prize.exclusive {
            self.won_exclusive[index] = true;
        }
        self.results[index].prizes.push(prize.code.clone());
        true
    }
}

/// Awards prizes to ranked results.
///
/// Returns the results with their prizes filled in and the winner list of
/// every prize category in report order.
pub fn allocate_prizes(
    results: Vec<OverallResult>,
    registry: &CategoryRegistry,
) -> (Vec<OverallResult>, Vec<PrizeList>) {
    let categories = registry.prize_categories().len();
    let mut allocation = Allocation {
        registry,
        won_exclusive: vec![false; results.len()],
        results,
        winners: vec![Vec::new(); categories],
    };

    for (report, prize) in registry.allocation_order() {
        if prize.prizes > 0 {
            allocation.award_next(report, prize);
        }
    }

    for (report, prize) in registry.allocation_order() {
        while allocation.winners[report].len() < prize.prizes {
            if !allocation.award_next(report, prize) {
                break;
            }
        }
    }

    let Allocation {
        results, winners, ..
    } = allocation;

    let lists = registry
        .prize_categories()
        .iter()
        .zip(winners)
        .map(|(prize, indices)| PrizeList {
            category: prize.code.clone(),
            name: prize.name.clone(),
            winners: indices.into_iter().map(|index| results[index].bib).collect(),
        })
        .collect();

    tracing::debug!(categories, "allocated prizes");
    (results, lists)
}
