//! Evolving a private copy of a population on a background thread.

use super::types::Algorithm;
use crate::error::{Error, Result};
use crate::population::Population;
use std::thread::{self, JoinHandle};

/// A running background evolution started by [`spawn_evolution`].
pub struct EvolutionHandle {
    handle: JoinHandle<Result<Population>>,
}

impl EvolutionHandle {
    /// Blocks until the evolution finishes and returns the evolved copy.
    pub fn join(self) -> Result<Population> {
        self.handle
            .join()
            .map_err(|payload| Error::WorkerPanic(panic_message(payload.as_ref())))?
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Evolves a copy of `population` with a copy of `algorithm` on a new thread.
///
/// Both copies are taken before the thread starts, so the caller's
/// population and algorithm are never touched by the worker.
pub fn spawn_evolution(algorithm: &dyn Algorithm, population: &Population) -> Result<EvolutionHandle> {
    let mut algorithm = algorithm.clone_box();
    let mut population = population.clone();
    let handle = thread::Builder::new()
        .name(format!("evolve-{}", algorithm.name()))
        .spawn(move || {
            algorithm.evolve(&mut population)?;
            Ok(population)
        })
        .map_err(|e| Error::WorkerPanic(format!("failed to spawn worker: {e}")))?;
    Ok(EvolutionHandle { handle })
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
