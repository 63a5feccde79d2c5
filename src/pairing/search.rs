use log::{debug, trace};

use super::cut_round;
use super::groups::{Entrant, ScoreGroup};
use crate::domain::{PlayerId, StandingsTable};

/// Pairs chosen so far. Extending it yields a new value, so a failed
/// branch never has anything to undo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    pairs: Vec<(Entrant, Entrant)>,
    rematches: usize,
}

impl Assignment {
    pub fn with_pair(&self, first: Entrant, second: Entrant, rematch: bool) -> Self {
        let mut pairs = self.pairs.clone();
        pairs.push((first, second));
        Self {
            pairs,
            rematches: self.rematches + usize::from(rematch),
        }
    }

    pub fn merged(&self, other: &Assignment) -> Self {
        let mut pairs = self.pairs.clone();
        pairs.extend(other.pairs.iter().copied());
        Self {
            pairs,
            rematches: self.rematches + other.rematches,
        }
    }

    pub fn pairs(&self) -> &[(Entrant, Entrant)] {
        &self.pairs
    }

    pub fn rematches(&self) -> usize {
        self.rematches
    }
}

/// Search nodes left for one round, shared by every pass
#[derive(Debug)]
pub struct SearchBudget {
    remaining: usize,
    spent: usize,
}

impl SearchBudget {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            remaining: max_attempts,
            spent: 0,
        }
    }

    /// Take one node from the budget; false once it has run out
    pub fn try_spend(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.spent += 1;
        true
    }

    pub fn exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn spent(&self) -> usize {
        self.spent
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Set aside at most `limit` nodes for a sub-search
    pub fn share(&mut self, limit: usize) -> SearchBudget {
        let nodes = limit.min(self.remaining);
        self.remaining -= nodes;
        SearchBudget::new(nodes)
    }

    /// Take back what a sub-search left unspent and count what it used
    pub fn absorb(&mut self, share: SearchBudget) {
        self.remaining += share.remaining;
        self.spent += share.spent;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No rematches at all
    Strict,
    /// Rematches allowed up to a running allowance
    Relaxed,
}

/// Position a player would face under a top-half vs bottom-half fold
pub fn fold_partner(position: usize, size: usize) -> usize {
    let half = size / 2;
    if position < half { position + half } else { position - half }
}

pub fn crosses_half(a: usize, b: usize, size: usize) -> bool {
    let half = size / 2;
    (a < half) != (b < half)
}

/// Candidates for `first`, cross-half first, then by distance from the fold partner
pub fn preference_order(first: usize, others: &[usize], size: usize) -> Vec<usize> {
    let ideal = fold_partner(first, size);
    let mut ordered = others.to_vec();
    ordered.sort_by_key(|&j| (!crosses_half(first, j, size), j.abs_diff(ideal), j));
    ordered
}

fn without(remaining: &[usize], taken: usize) -> Vec<usize> {
    remaining.iter().copied().filter(|&k| k != taken).collect()
}

/// Rematch-free matching of one pool. Cross-half pairs only on the first
/// pass; any pair on the second.
pub fn strict_match(
    pool: &[Entrant],
    table: &StandingsTable,
    budget: &mut SearchBudget,
) -> Option<Assignment> {
    let everyone: Vec<usize> = (0..pool.len()).collect();
    strict_search(pool, &everyone, Assignment::default(), true, table, budget)
        .or_else(|| strict_search(pool, &everyone, Assignment::default(), false, table, budget))
}

fn strict_search(
    pool: &[Entrant],
    remaining: &[usize],
    acc: Assignment,
    cross_only: bool,
    table: &StandingsTable,
    budget: &mut SearchBudget,
) -> Option<Assignment> {
    let Some((&first, rest)) = remaining.split_first() else {
        return Some(acc);
    };
    if !budget.try_spend() {
        return None;
    }

    for j in preference_order(first, rest, pool.len()) {
        if cross_only && !crosses_half(first, j, pool.len()) {
            continue;
        }
        if table.have_met(pool[first].id, pool[j].id) {
            continue;
        }

        let next = acc.with_pair(pool[first], pool[j], false);
        if let Some(found) = strict_search(pool, &without(rest, j), next, cross_only, table, budget) {
            return Some(found);
        }
        if budget.exhausted() {
            return None;
        }
    }

    None
}

/// Matching of one pool using at most `allowance` rematches. The most
/// constrained player is placed first; fresh opponents are tried before
/// rematches, and rematches before more recent ones.
pub fn relaxed_match(
    pool: &[Entrant],
    allowance: usize,
    table: &StandingsTable,
    budget: &mut SearchBudget,
) -> Option<Assignment> {
    let everyone: Vec<usize> = (0..pool.len()).collect();
    relaxed_search(pool, &everyone, Assignment::default(), allowance, table, budget)
}

fn relaxed_search(
    pool: &[Entrant],
    remaining: &[usize],
    acc: Assignment,
    allowance: usize,
    table: &StandingsTable,
    budget: &mut SearchBudget,
) -> Option<Assignment> {
    if remaining.is_empty() {
        return Some(acc);
    }
    if !budget.try_spend() {
        return None;
    }

    let first = most_constrained(pool, remaining, table);
    let others = without(remaining, first);

    let (fresh, mut repeats): (Vec<usize>, Vec<usize>) = preference_order(first, &others, pool.len())
        .into_iter()
        .partition(|&j| !table.have_met(pool[first].id, pool[j].id));
    repeats.sort_by_key(|&j| last_met(table, pool[first].id, pool[j].id));

    let fresh = fresh.into_iter().map(|j| (j, false));
    let repeats = repeats.into_iter().map(|j| (j, true));

    for (j, rematch) in fresh.chain(repeats) {
        if rematch && allowance == 0 {
            break;
        }
        let next = acc.with_pair(pool[first], pool[j], rematch);
        let left = allowance - usize::from(rematch);
        if let Some(found) = relaxed_search(pool, &without(&others, j), next, left, table, budget) {
            return Some(found);
        }
        if budget.exhausted() {
            return None;
        }
    }

    None
}

fn last_met(table: &StandingsTable, a: PlayerId, b: PlayerId) -> u8 {
    table.get(a).and_then(|s| s.last_met(b)).unwrap_or(0)
}

/// Unpaired player with the fewest fresh opponents left
fn most_constrained(pool: &[Entrant], remaining: &[usize], table: &StandingsTable) -> usize {
    remaining
        .iter()
        .copied()
        .min_by_key(|&i| {
            let options = remaining
                .iter()
                .filter(|&&j| j != i && !table.have_met(pool[i].id, pool[j].id))
                .count();
            (options, i)
        })
        .unwrap_or(remaining[0])
}

/// Walks the score groups top-down, carrying floaters into the next group
pub struct Planner<'a> {
    groups: &'a [ScoreGroup],
    table: &'a StandingsTable,
    budget: &'a mut SearchBudget,
    mode: Mode,
    cut_group: Option<usize>,
    cut_round_nodes: usize,
    stuck: Vec<PlayerId>,
}

impl<'a> Planner<'a> {
    pub fn new(
        groups: &'a [ScoreGroup],
        table: &'a StandingsTable,
        budget: &'a mut SearchBudget,
        mode: Mode,
    ) -> Self {
        Self {
            groups,
            table,
            budget,
            mode,
            cut_group: None,
            cut_round_nodes: 0,
            stuck: Vec::new(),
        }
    }

    /// Optimise the spread of the group at `index` instead of taking the
    /// first fit, spending at most `nodes` (and never more than half of
    /// what is left) on each attempt
    pub fn with_cut_group(mut self, index: Option<usize>, nodes: usize) -> Self {
        self.cut_group = index;
        self.cut_round_nodes = nodes;
        self
    }

    /// Players of the last pool that could not be matched
    pub fn stuck(&self) -> &[PlayerId] {
        &self.stuck
    }

    pub fn run(&mut self, allowance: usize) -> Option<Assignment> {
        let found = self.plan(0, Vec::new(), allowance);
        if let Some(assignment) = &found {
            debug!(
                "{:?} plan found: {} pairs, {} rematches, {} nodes",
                self.mode,
                assignment.pairs().len(),
                assignment.rematches(),
                self.budget.spent()
            );
        }
        found
    }

    fn plan(&mut self, index: usize, carried: Vec<Entrant>, allowance: usize) -> Option<Assignment> {
        let groups = self.groups;
        let Some(group) = groups.get(index) else {
            return carried.is_empty().then(Assignment::default);
        };
        let is_last = index + 1 == groups.len();

        let pool: Vec<Entrant> = carried.iter().chain(group.members.iter()).copied().collect();

        if pool.len() % 2 == 1 {
            if !is_last {
                for floater in float_candidates(&pool, carried.len()) {
                    let rest: Vec<Entrant> = pool.iter().copied().filter(|e| e.id != floater.id).collect();
                    trace!("Score group {:+}: trying {} as floater", group.score, floater.id);
                    if let Some(found) = self.pair_then_continue(index, &rest, vec![floater], allowance) {
                        return Some(found);
                    }
                    if self.budget.exhausted() {
                        return None;
                    }
                }
            }
        } else if let Some(found) = self.pair_then_continue(index, &pool, Vec::new(), allowance) {
            return Some(found);
        }

        if is_last || self.budget.exhausted() {
            self.record_stuck(&pool);
            return None;
        }

        trace!("Score group {:+}: merging {} players downward", group.score, pool.len());
        self.plan(index + 1, pool, allowance)
    }

    fn pair_then_continue(
        &mut self,
        index: usize,
        pool: &[Entrant],
        carry: Vec<Entrant>,
        allowance: usize,
    ) -> Option<Assignment> {
        let here = self.match_pool(index, pool, allowance)?;
        let below = self.plan(index + 1, carry, allowance - here.rematches())?;
        Some(here.merged(&below))
    }

    fn match_pool(&mut self, index: usize, pool: &[Entrant], allowance: usize) -> Option<Assignment> {
        let table = self.table;
        let budget = &mut *self.budget;

        let found = match self.mode {
            Mode::Strict if self.cut_group == Some(index) => {
                let limit = self.cut_round_nodes.min(budget.remaining() / 2);
                let mut share = budget.share(limit);
                let optimised = cut_round::optimise(pool, table, &mut share);
                let stopped = share.exhausted();
                budget.absorb(share);
                match optimised {
                    None if stopped => strict_match(pool, table, budget),
                    found => found,
                }
            }
            Mode::Strict => strict_match(pool, table, budget),
            Mode::Relaxed => (0..=allowance).find_map(|k| relaxed_match(pool, k, table, budget)),
        };

        if found.is_none() {
            self.record_stuck(pool);
        }
        found
    }

    fn record_stuck(&mut self, pool: &[Entrant]) {
        self.stuck = pool.iter().map(|e| e.id).collect();
    }
}

/// Floater order for an odd pool: players native to the group before
/// carried ones, fewest previous floats, lowest score, lowest ranked
fn float_candidates(pool: &[Entrant], carried: usize) -> Vec<Entrant> {
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.sort_by_key(|&i| {
        (
            i < carried,
            pool[i].floats,
            pool[i].score,
            std::cmp::Reverse(i),
        )
    });
    order.into_iter().map(|i| pool[i]).collect()
}
