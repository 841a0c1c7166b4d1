//! The algorithm contract.

use crate::error::{Error, Result};
use crate::population::Population;
use std::fmt;

/// An optimization strategy that evolves a population in place.
///
/// # Contract
///
/// - The population must be non-empty; algorithms configured for a fixed
///   dimension reject populations whose problem disagrees with it. Both cases
///   fail with [`Error::InvalidPopulation`] before any evaluation.
/// - On return the population has the same size and problem, and every
///   individual's cached fitness belongs to its decision vector.
/// - Randomness comes from a generator owned by the instance, so a seeded
///   instance is deterministic and two instances never share a stream.
/// - The problem is never mutated.
///
/// When `evolve` fails part-way, the population holds every strict
/// improvement found before the failure and nothing worse than its input.
pub trait Algorithm: Send {
    /// Applies one round of search to `population`.
    fn evolve(&mut self, population: &mut Population) -> Result<()>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// One-line summary of the configuration.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Copies the algorithm, generator state included.
    fn clone_box(&self) -> Box<dyn Algorithm>;
}

impl Clone for Box<dyn Algorithm> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl fmt::Debug for dyn Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Display for dyn Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Checks the preconditions shared by every algorithm.
///
/// `expected_dimension` is the dimension the algorithm was built for, if any.
pub fn check_population(population: &Population, expected_dimension: Option<usize>) -> Result<()> {
    if population.is_empty() {
        return Err(Error::InvalidPopulation("population is empty".into()));
    }
    if let Some(expected) = expected_dimension {
        if population.dimension() != expected {
            return Err(Error::InvalidPopulation(format!(
                "algorithm expects dimension {expected}, population problem has {}",
                population.dimension()
            )));
        }
    }
    Ok(())
}
