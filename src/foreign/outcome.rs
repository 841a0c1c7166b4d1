//! Folding a foreign solver's result back into the population.

use super::abi::{RawOutcome, SolverStatus};
use crate::error::{Error, Result};
use crate::population::{Individual, Population};
use tracing::{debug, warn};

/// Writes the solver's point over the worst member when it earns the slot.
///
/// On success the point must strictly beat the current worst; otherwise it
/// must strictly beat `start`, and the call fails with
/// [`Error::SolverDivergence`] after the write.
pub(crate) fn settle(
    population: &mut Population,
    start: &Individual,
    mut x: Vec<f64>,
    outcome: RawOutcome,
    solver: &str,
) -> Result<()> {
    let status = SolverStatus::from_raw(outcome.status);
    let problem = population.problem().clone();

    let candidate = if x.iter().all(|v| v.is_finite()) {
        problem.bounds().clamp(&mut x);
        Some(Individual::evaluate(problem.as_ref(), x)?)
    } else {
        None
    };

    if status.is_success() {
        if let Some(candidate) = candidate {
            let improves = population
                .worst()
                .is_some_and(|worst| candidate.is_better_than(worst));
            if improves {
                population.replace_worst(candidate)?;
            }
            debug!(solver, ?status, iterations = outcome.iterations, improves, "local solve finished");
        }
        return Ok(());
    }

    if let Some(candidate) = candidate {
        if candidate.is_better_than(start) {
            population.replace_worst(candidate)?;
        }
    }
    warn!(solver, ?status, iterations = outcome.iterations, "local solver diverged");
    Err(Error::SolverDivergence {
        status,
        iterations: outcome.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foreign::abi::status;
    use crate::problem::{Bounds, FnProblem, Problem};
    use std::sync::Arc;

    fn population() -> (Population, Individual) {
        let p: Arc<dyn Problem> = Arc::new(FnProblem::new(Bounds::uniform(1, -2.0, 2.0).unwrap(), |x| {
            Ok(x[0] * x[0])
        }));
        let mut pop = Population::new(p);
        pop.push(vec![0.5]).unwrap();
        pop.push(vec![1.5]).unwrap();
        let start = pop.best().unwrap().clone();
        (pop, start)
    }

    fn fitnesses(pop: &Population) -> Vec<f64> {
        pop.iter().map(|i| i.fitness()[0]).collect()
    }

    #[test]
    fn test_success_replaces_worst() {
        let (mut pop, start) = population();
        let out = RawOutcome::new(status::XTOL_REACHED, 4, 1.0);
        settle(&mut pop, &start, vec![1.0], out, "t").unwrap();
        assert_eq!(fitnesses(&pop), vec![0.25, 1.0]);
    }

    #[test]
    fn test_success_clamps_out_of_bounds_result() {
        let (mut pop, start) = population();
        let out = RawOutcome::new(status::SUCCESS, 1, 0.0);
        settle(&mut pop, &start, vec![-9.0], out, "t").unwrap();
        // clamped to -2, fitness 4 does not beat the worst
        assert_eq!(fitnesses(&pop), vec![0.25, 2.25]);
    }

    #[test]
    fn test_divergence_keeps_only_strict_improvement() {
        let (mut pop, start) = population();
        let out = RawOutcome::new(status::MAXITER_REACHED, 9, 0.81);
        let err = settle(&mut pop, &start, vec![0.9], out, "t").unwrap_err();
        assert!(matches!(
            err,
            Error::SolverDivergence { status: SolverStatus::MaxIterReached, iterations: 9 }
        ));
        assert_eq!(fitnesses(&pop), vec![0.25, 2.25]);

        let out = RawOutcome::new(status::ROUNDOFF, 2, 0.01);
        assert!(settle(&mut pop, &start, vec![0.1], out, "t").is_err());
        let mut after = fitnesses(&pop);
        after.sort_by(f64::total_cmp);
        assert!((after[0] - 0.01).abs() < 1e-12);
        assert_eq!(after[1], 0.25);
    }

    #[test]
    fn test_non_finite_result_is_ignored() {
        let (mut pop, start) = population();
        let out = RawOutcome::new(status::SUCCESS, 1, f64::NAN);
        settle(&mut pop, &start, vec![f64::NAN], out, "t").unwrap();
        assert_eq!(fitnesses(&pop), vec![0.25, 2.25]);
    }
}
