//! Concurrent island evolution.

use super::config::Dispatch;
use super::types::{EvolutionFailures, Island};
use crate::algorithm::{panic_message, Algorithm};
use crate::error::{Error, Result};
use crate::population::{Individual, Population};
use std::thread;
use tracing::{debug, info, warn};

/// Work handed to one worker: exclusive access to an island's algorithm and
/// a private copy of its population.
type Job<'a> = (usize, &'a mut Box<dyn Algorithm>, Population);

/// What a worker hands back. The population is `None` when the worker
/// panicked and its copy was lost.
type Report = (Option<Population>, Result<()>);

/// A set of islands evolved concurrently, one round at a time.
///
/// Each round gives every worker exclusive use of its island's algorithm and
/// a copy of its population. After all workers have finished, each copy is
/// written back to the island it came from. Islands never share state during
/// a round, so seeded algorithms produce the same result whatever the
/// scheduling.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_globopt::archipelago::{Archipelago, Island};
/// use u_globopt::population::Population;
/// use u_globopt::problem::{Bounds, FnProblem, Problem};
/// use u_globopt::random::create_rng;
/// use u_globopt::sa::{Annealing, AnnealingConfig};
///
/// let problem: Arc<dyn Problem> = Arc::new(FnProblem::new(Bounds::uniform(2, -5.0, 5.0).unwrap(), |x| {
///     Ok(x.iter().map(|v| v * v).sum())
/// }));
///
/// let mut archipelago = Archipelago::default();
/// for seed in 0..3 {
///     let pop = Population::random(problem.clone(), 8, &mut create_rng(Some(seed))).unwrap();
///     let sa = Annealing::new(2, AnnealingConfig::default().with_seed(seed)).unwrap();
///     archipelago.push(Island::new(sa, pop));
/// }
///
/// archipelago.evolve_rounds(2).unwrap();
/// assert!(archipelago.champion().unwrap().fitness()[0] < 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Archipelago {
    islands: Vec<Island>,
    dispatch: Dispatch,
}

impl Archipelago {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            islands: Vec::new(),
            dispatch,
        }
    }

    pub fn with_island(mut self, island: Island) -> Self {
        self.push(island);
        self
    }

    pub fn push(&mut self, island: Island) {
        self.islands.push(island);
    }

    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    pub fn island(&self, index: usize) -> Option<&Island> {
        self.islands.get(index)
    }

    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    pub fn into_islands(self) -> Vec<Island> {
        self.islands
    }

    /// Runs one `evolve` per island concurrently and waits for all of them.
    ///
    /// Islands that fail keep whatever their copy held when the algorithm
    /// returned; islands whose worker panicked keep their previous
    /// population. Failures are reported together, by ascending index,
    /// after every island has been written back.
    pub fn evolve(&mut self) -> std::result::Result<(), EvolutionFailures> {
        let dispatch = self.dispatch;
        let jobs: Vec<Job<'_>> = self
            .islands
            .iter_mut()
            .enumerate()
            .map(|(index, island)| (index, &mut island.algorithm, island.population.clone()))
            .collect();

        let reports = match dispatch {
            Dispatch::Threads => run_threads(jobs),
            #[cfg(feature = "parallel")]
            Dispatch::Pool => run_pool(jobs),
        };

        let mut failures = Vec::new();
        for (index, (island, (population, outcome))) in self.islands.iter_mut().zip(reports).enumerate() {
            if let Some(population) = population {
                island.population = population;
            }
            if let Err(cause) = outcome {
                warn!(index, algorithm = island.algorithm.name(), error = %cause, "island failed");
                failures.push(Error::EvolutionFailure {
                    index,
                    cause: Box::new(cause),
                });
            }
        }

        debug!(islands = self.islands.len(), failed = failures.len(), ?dispatch, "round finished");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(EvolutionFailures { failures })
        }
    }

    /// Runs `rounds` rounds, stopping after the first round with a failure.
    pub fn evolve_rounds(&mut self, rounds: usize) -> std::result::Result<(), EvolutionFailures> {
        for round in 0..rounds {
            self.evolve()?;
            info!(round, champion = ?self.champion().map(|c| c.fitness().to_vec()), "archipelago round");
        }
        Ok(())
    }

    /// Best individual over all islands.
    pub fn champion(&self) -> Option<&Individual> {
        self.islands
            .iter()
            .filter_map(|island| island.population.best())
            .min_by(|a, b| a.compare(b))
    }
}

fn evolve_copy(algorithm: &mut Box<dyn Algorithm>, mut population: Population) -> (Population, Result<()>) {
    let outcome = algorithm.evolve(&mut population);
    (population, outcome)
}

fn run_threads(jobs: Vec<Job<'_>>) -> Vec<Report> {
    thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|(index, algorithm, population)| {
                thread::Builder::new()
                    .name(format!("island-{index}"))
                    .spawn_scoped(scope, move || evolve_copy(algorithm, population))
            })
            .collect();

        handles
            .into_iter()
            .map(|spawned| match spawned {
                Ok(handle) => match handle.join() {
                    Ok((population, outcome)) => (Some(population), outcome),
                    Err(payload) => (None, Err(Error::WorkerPanic(panic_message(payload.as_ref())))),
                },
                Err(e) => (None, Err(Error::WorkerPanic(format!("failed to spawn worker: {e}")))),
            })
            .collect()
    })
}

#[cfg(feature = "parallel")]
fn run_pool(jobs: Vec<Job<'_>>) -> Vec<Report> {
    use rayon::prelude::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    jobs.into_par_iter()
        .map(|(_, algorithm, population)| {
            match catch_unwind(AssertUnwindSafe(move || evolve_copy(algorithm, population))) {
                Ok((population, outcome)) => (Some(population), outcome),
                Err(payload) => (None, Err(Error::WorkerPanic(panic_message(payload.as_ref())))),
            }
        })
        .collect()
}
