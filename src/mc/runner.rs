//! Monte Carlo sampling loop.

use super::config::MonteCarloConfig;
use crate::algorithm::{check_population, Algorithm};
use crate::error::{Error, Result};
use crate::population::{Individual, Population};
use crate::random::create_rng;
use rand::rngs::StdRng;
use tracing::debug;

/// Pure random search.
///
/// Draws uniform samples inside the bounds; each sample that ranks strictly
/// ahead of the current worst member replaces it.
#[derive(Debug, Clone)]
pub struct MonteCarlo {
    config: MonteCarloConfig,
    rng: StdRng,
}

impl MonteCarlo {
    pub fn new(config: MonteCarloConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        Ok(Self {
            rng: create_rng(config.seed),
            config,
        })
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }
}

impl Algorithm for MonteCarlo {
    fn evolve(&mut self, population: &mut Population) -> Result<()> {
        check_population(population, None)?;
        let problem = population.problem().clone();
        let mut replaced = 0usize;

        for _ in 0..self.config.samples {
            let x = problem.bounds().sample(&mut self.rng);
            let candidate = Individual::evaluate(problem.as_ref(), x)?;
            let worst = population
                .worst()
                .ok_or_else(|| Error::InvalidPopulation("population is empty".into()))?;
            if candidate.is_better_than(worst) {
                population.replace_worst(candidate)?;
                replaced += 1;
            }
        }

        debug!(samples = self.config.samples, replaced, "monte carlo finished");
        Ok(())
    }

    fn name(&self) -> &str {
        "monte-carlo"
    }

    fn describe(&self) -> String {
        format!("monte-carlo(samples={})", self.config.samples)
    }

    fn clone_box(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }
}
