//! Islands and round failures.

use crate::algorithm::Algorithm;
use crate::error::Error;
use crate::population::Population;
use thiserror::Error;

/// An algorithm paired with the population it evolves.
#[derive(Debug, Clone)]
pub struct Island {
    pub(crate) algorithm: Box<dyn Algorithm>,
    pub(crate) population: Population,
}

impl Island {
    pub fn new(algorithm: impl Algorithm + 'static, population: Population) -> Self {
        Self::from_boxed(Box::new(algorithm), population)
    }

    pub fn from_boxed(algorithm: Box<dyn Algorithm>, population: Population) -> Self {
        Self { algorithm, population }
    }

    pub fn algorithm(&self) -> &dyn Algorithm {
        self.algorithm.as_ref()
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn into_parts(self) -> (Box<dyn Algorithm>, Population) {
        (self.algorithm, self.population)
    }
}

/// Islands that failed during one round.
///
/// Every entry is an [`Error::EvolutionFailure`], ordered by island index.
#[derive(Debug, Clone, Error)]
#[error("{} island(s) failed to evolve", .failures.len())]
pub struct EvolutionFailures {
    pub failures: Vec<Error>,
}

impl EvolutionFailures {
    /// Indices of the failed islands, ascending.
    pub fn indices(&self) -> Vec<usize> {
        self.failures.iter().filter_map(Error::island_index).collect()
    }
}
