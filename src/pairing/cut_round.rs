use log::{debug, warn};

use super::groups::Entrant;
use super::search::{crosses_half, fold_partner, preference_order, Assignment, SearchBudget};
use crate::domain::{Seed, StandingsTable};

/// Difference between the widest and the narrowest seed gap of a pairing
pub fn seed_spread(pairs: &[(Seed, Seed)]) -> u32 {
    let gaps = pairs.iter().map(|&(a, b)| a.abs_diff(b));
    match (gaps.clone().min(), gaps.max()) {
        (Some(low), Some(high)) => high - low,
        _ => 0,
    }
}

#[derive(Debug, Clone)]
struct Best {
    spread: u32,
    deviation: usize,
    assignment: Assignment,
}

#[derive(Debug, Clone, Copy)]
struct Gaps {
    low: u32,
    high: u32,
}

impl Gaps {
    fn with(self, gap: u32) -> Self {
        Self {
            low: self.low.min(gap),
            high: self.high.max(gap),
        }
    }

    fn spread(self) -> u32 {
        self.high.saturating_sub(self.low)
    }
}

/// Exhaustive rematch-free matching of the cut-line group that keeps seed
/// gaps as even as possible. Top half against bottom half is searched
/// first; mixed pairings only when no such matching exists. Ties go to the
/// pairing closest to the fold, then to the one met first in preference order.
pub fn optimise(pool: &[Entrant], table: &StandingsTable, budget: &mut SearchBudget) -> Option<Assignment> {
    let mut best: Option<Best> = None;
    let everyone: Vec<usize> = (0..pool.len()).collect();
    let start = Gaps {
        low: u32::MAX,
        high: 0,
    };

    for cross_only in [true, false] {
        let search = Search {
            pool,
            table,
            cross_only,
        };
        search.branch(&everyone, Assignment::default(), start, 0, budget, &mut best);
        if best.is_some() || budget.exhausted() {
            break;
        }
    }

    if budget.exhausted() {
        warn!(
            "Cut-line search over {} players stopped early; keeping best pairing found",
            pool.len()
        );
    }

    best.map(|b| {
        debug!(
            "Cut-line group of {}: seed spread {}, fold deviation {}",
            pool.len(),
            b.spread,
            b.deviation
        );
        b.assignment
    })
}

struct Search<'a> {
    pool: &'a [Entrant],
    table: &'a StandingsTable,
    cross_only: bool,
}

impl Search<'_> {
    fn branch(
        &self,
        remaining: &[usize],
        acc: Assignment,
        gaps: Gaps,
        deviation: usize,
        budget: &mut SearchBudget,
        best: &mut Option<Best>,
    ) {
        // spread and deviation never shrink as pairs are added
        if let Some(current) = best {
            let spread = if acc.pairs().is_empty() { 0 } else { gaps.spread() };
            if (spread, deviation) >= (current.spread, current.deviation) {
                return;
            }
        }

        let Some((&first, rest)) = remaining.split_first() else {
            *best = Some(Best {
                spread: gaps.spread(),
                deviation,
                assignment: acc,
            });
            return;
        };

        if !budget.try_spend() {
            return;
        }

        let size = self.pool.len();
        let ideal = fold_partner(first, size);
        for j in preference_order(first, rest, size) {
            if self.cross_only && !crosses_half(first, j, size) {
                continue;
            }
            let (a, b) = (self.pool[first], self.pool[j]);
            if self.table.have_met(a.id, b.id) {
                continue;
            }

            let next_remaining: Vec<usize> = rest.iter().copied().filter(|&k| k != j).collect();
            self.branch(
                &next_remaining,
                acc.with_pair(a, b, false),
                gaps.with(a.seed.abs_diff(b.seed)),
                deviation + j.abs_diff(ideal),
                budget,
                best,
            );

            if budget.exhausted() {
                return;
            }
        }
    }
}
