//! Hypergeometric odds for "if I buy n more bags, how likely am I to pull
//! exactly k chases". Independent of how the state got where it is; only the
//! current remaining bags and chases matter.

use crate::state::BagState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbabilityQuery {
    pub bags_drawn: u32,
    pub chases_wanted: u32,
}

impl ProbabilityQuery {
    pub const fn new(bags_drawn: u32, chases_wanted: u32) -> Self {
        Self {
            bags_drawn,
            chases_wanted,
        }
    }
}

/// The fixed scenarios shown next to the free-form query.
pub const CANONICAL_QUERIES: [ProbabilityQuery; 5] = [
    ProbabilityQuery::new(2, 0),
    ProbabilityQuery::new(3, 0),
    ProbabilityQuery::new(3, 1),
    ProbabilityQuery::new(3, 2),
    ProbabilityQuery::new(3, 3),
];

/// The population a query is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Population {
    pub bags: u32,
    pub chases: u32,
}

impl Population {
    /// Remaining bags are unsold slots; queued reservations do not count
    /// against the population. Chases can outnumber the unsold bags once
    /// the chase count is raised past them, in which case every query
    /// reports zero.
    pub fn from_state(state: &BagState) -> Self {
        Self {
            bags: state.bag_count() - state.sold_count(),
            chases: state.remaining_chases(),
        }
    }

    /// Probability in `0.0..=1.0`. Impossible queries yield zero rather than
    /// an error.
    pub fn probability(&self, query: ProbabilityQuery) -> f64 {
        let n = query.bags_drawn;
        let k = query.chases_wanted;
        if n > self.bags || k > self.chases || n < k {
            return 0.0;
        }

        let Some(blanks) = self.bags.checked_sub(self.chases) else {
            return 0.0;
        };

        let numerator = combination(self.chases, k) * combination(blanks, n - k);
        let denominator = combination(self.bags, n);
        if denominator == 0.0 {
            return 0.0;
        }
        numerator / denominator
    }

    pub fn percent_label(&self, query: ProbabilityQuery) -> String {
        format!("{:.2}", self.probability(query) * 100.0)
    }
}

/// `n choose r`, built up one factor at a time so intermediate values stay
/// the size of the result instead of a full factorial.
pub fn combination(n: u32, r: u32) -> f64 {
    if r > n {
        return 0.0;
    }
    if r == 0 {
        return 1.0;
    }

    let r = r.min(n - r);
    let mut result = 1.0_f64;
    for i in 1..=r {
        result = result * f64::from(n - r + i) / f64::from(i);
    }
    result.round()
}
