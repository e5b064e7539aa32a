use bagtrack_core::probability::{CANONICAL_QUERIES, Population, ProbabilityQuery};

use crate::Session;

#[derive(Debug, Clone, PartialEq)]
pub struct OddsRow {
    pub query: ProbabilityQuery,
    pub percent: f64,
    pub label: String,
}

impl Session<'_> {
    /// Odds against what is left on the grid right now.
    pub fn population(&self) -> Population {
        Population::from_state(&self.state)
    }

    pub fn odds(&self, query: ProbabilityQuery) -> OddsRow {
        let population = self.population();
        OddsRow {
            query,
            percent: population.probability(query) * 100.0,
            label: population.percent_label(query),
        }
    }

    pub fn canonical_odds(&self) -> Vec<OddsRow> {
        CANONICAL_QUERIES
            .iter()
            .map(|query| self.odds(*query))
            .collect()
    }
}
