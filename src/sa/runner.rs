//! Adaptive simulated annealing walk.

use super::config::AnnealingConfig;
use super::types::AnnealingStats;
use crate::algorithm::{check_population, Algorithm};
use crate::error::{Error, Result};
use crate::population::{Individual, Population};
use crate::problem::{Bounds, Problem};
use crate::random::{create_rng, uniform};
use rand::rngs::StdRng;
use rand::Rng;
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Acceptance ratio above which a step grows.
const GROW_ABOVE: f64 = 0.6;
/// Acceptance ratio below which a step shrinks.
const SHRINK_BELOW: f64 = 0.4;
/// Steps never exceed the full bound width.
const MAX_STEP: f64 = 1.0;

/// Adaptive simulated annealing over a box-bounded continuous problem.
///
/// Starts from the population's best individual and walks by perturbing one
/// component at a time. If the walk finds a point strictly better than its
/// start, that point replaces the population's worst member; other members
/// are left untouched.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_globopt::algorithm::Algorithm;
/// use u_globopt::population::Population;
/// use u_globopt::problem::{Bounds, FnProblem, Problem};
/// use u_globopt::random::create_rng;
/// use u_globopt::sa::{Annealing, AnnealingConfig};
///
/// let problem: Arc<dyn Problem> = Arc::new(FnProblem::new(
///     Bounds::uniform(2, -5.0, 5.0).unwrap(),
///     |x| Ok(x.iter().map(|v| v * v).sum()),
/// ));
/// let mut pop = Population::random(problem, 10, &mut create_rng(Some(1))).unwrap();
/// let mut sa = Annealing::new(2, AnnealingConfig::default().with_seed(7)).unwrap();
/// sa.evolve(&mut pop).unwrap();
/// assert!(pop.best().unwrap().fitness()[0] < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Annealing {
    config: AnnealingConfig,
    dimension: usize,
    temperature_coefficient: f64,
    rng: StdRng,
    stats: Option<AnnealingStats>,
}

impl Annealing {
    /// Creates an annealer for problems of the given dimension.
    pub fn new(dimension: usize, config: AnnealingConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        if dimension == 0 {
            return Err(Error::InvalidConfig("dimension must be at least 1".into()));
        }
        Ok(Self {
            temperature_coefficient: config.temperature_coefficient(),
            rng: create_rng(config.seed),
            config,
            dimension,
            stats: None,
        })
    }

    /// Creates an annealer sized for `problem`.
    pub fn for_problem(problem: &dyn Problem, config: AnnealingConfig) -> Result<Self> {
        Self::new(problem.dimension(), config)
    }

    pub fn config(&self) -> &AnnealingConfig {
        &self.config
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn temperature_coefficient(&self) -> f64 {
        self.temperature_coefficient
    }

    /// Statistics of the last completed or failed walk.
    pub fn last_stats(&self) -> Option<&AnnealingStats> {
        self.stats.as_ref()
    }

    fn walk(
        &mut self,
        problem: &dyn Problem,
        start: &Individual,
        best: &mut Individual,
        stats: &mut AnnealingStats,
    ) -> Result<()> {
        let n = self.dimension;
        let bounds = problem.bounds();
        let window = self.config.iterations_per_adaptation;
        let mut current = start.clone();
        let mut steps = vec![self.config.start_step; n];
        let mut accepted = vec![0usize; n];
        let mut temperature = self.config.initial_temperature;

        for outer in 0..self.config.outer_iterations {
            for _ in 0..self.config.iterations_per_temperature {
                for _ in 0..window {
                    let mut component = self.rng.random_range(0..n);
                    for _ in 0..n {
                        component = (component + 1) % n;
                        let mut x = current.x().to_vec();
                        x[component] =
                            perturb(&mut self.rng, bounds, component, x[component], steps[component]);
                        let candidate = Individual::evaluate(problem, x)?;
                        stats.evaluations += 1;

                        if accept(&mut self.rng, &candidate, &current, temperature) {
                            accepted[component] += 1;
                            stats.accepted_moves += 1;
                            current = candidate;
                            if current.is_better_than(best) {
                                *best = current.clone();
                            }
                        }
                    }
                }
                let ratios = adapt_steps(&mut steps, &mut accepted, window);
                trace!(outer, temperature, ?ratios, ?steps, "step adaptation");
                stats.acceptance_history.push(ratios);
            }
            temperature *= self.temperature_coefficient;
        }

        stats.final_temperature = temperature;
        stats.steps = steps;
        Ok(())
    }
}

impl Algorithm for Annealing {
    fn evolve(&mut self, population: &mut Population) -> Result<()> {
        check_population(population, Some(self.dimension))?;
        let problem = population.problem().clone();
        if problem.objective_count() != 1 {
            return Err(Error::InvalidPopulation(format!(
                "annealing handles single-objective problems, got {} objectives",
                problem.objective_count()
            )));
        }

        let start = population
            .best()
            .cloned()
            .ok_or_else(|| Error::InvalidPopulation("population is empty".into()))?;
        let mut best = start.clone();
        let mut stats = AnnealingStats::default();

        let outcome = self.walk(problem.as_ref(), &start, &mut best, &mut stats);

        if best.is_better_than(&start) {
            population.replace_worst(best)?;
            stats.improved = true;
        }
        debug!(
            evaluations = stats.evaluations,
            acceptance = stats.acceptance_ratio(),
            improved = stats.improved,
            "annealing finished"
        );
        self.stats = Some(stats);
        outcome
    }

    fn name(&self) -> &str {
        "annealing"
    }

    fn describe(&self) -> String {
        format!(
            "annealing(outer={}, temp={}, range={}, T0={}, Tf={}, step={})",
            self.config.outer_iterations,
            self.config.iterations_per_temperature,
            self.config.iterations_per_adaptation,
            self.config.initial_temperature,
            self.config.final_temperature,
            self.config.start_step
        )
    }

    fn clone_box(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }
}

/// New value for component `i`: a uniform step of up to `step` bound widths,
/// resampled anywhere in the bounds when it leaves them.
fn perturb<R: Rng>(rng: &mut R, bounds: &Bounds, i: usize, value: f64, step: f64) -> f64 {
    let (lo, hi) = (bounds.lower()[i], bounds.upper()[i]);
    let proposal = value + (2.0 * rng.random::<f64>() - 1.0) * step * bounds.width(i);
    if proposal < lo || proposal > hi {
        uniform(rng, lo, hi)
    } else {
        proposal
    }
}

/// Feasibility first; among equally violating points the Metropolis rule.
fn accept<R: Rng>(rng: &mut R, candidate: &Individual, current: &Individual, temperature: f64) -> bool {
    match candidate.violation().total_cmp(&current.violation()) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => {
            let delta = candidate.fitness()[0] - current.fitness()[0];
            if delta <= 0.0 {
                true
            } else {
                rng.random::<f64>() < (-delta / temperature).exp()
            }
        }
    }
}

/// Rescales each step from its acceptance ratio over the last `window`
/// sweeps and resets the counters. Returns the ratios.
pub(crate) fn adapt_steps(steps: &mut [f64], accepted: &mut [usize], window: usize) -> Vec<f64> {
    let mut ratios = Vec::with_capacity(steps.len());
    for (step, count) in steps.iter_mut().zip(accepted.iter_mut()) {
        let ratio = *count as f64 / window as f64;
        if ratio > GROW_ABOVE {
            *step *= 1.0 + 2.0 * (ratio - GROW_ABOVE) / SHRINK_BELOW;
        } else if ratio < SHRINK_BELOW {
            *step /= 1.0 + 2.0 * (SHRINK_BELOW - ratio) / SHRINK_BELOW;
        }
        *step = step.min(MAX_STEP);
        *count = 0;
        ratios.push(ratio);
    }
    ratios
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;
    use crate::problem::FnProblem;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn sphere(dim: usize) -> Arc<dyn Problem> {
        Arc::new(FnProblem::new(Bounds::uniform(dim, -5.0, 5.0).unwrap(), |x| {
            Ok(x.iter().map(|v| v * v).sum())
        }))
    }

    fn flat(dim: usize) -> Arc<dyn Problem> {
        Arc::new(FnProblem::new(Bounds::uniform(dim, -1.0, 1.0).unwrap(), |_| Ok(1.0)))
    }

    fn population(problem: Arc<dyn Problem>, size: usize, seed: u64) -> Population {
        Population::random(problem, size, &mut create_rng(Some(seed))).unwrap()
    }

    #[test]
    fn test_sphere_improves() {
        let mut pop = population(sphere(3), 8, 1);
        let before = pop.best().unwrap().fitness()[0];
        let config = AnnealingConfig::default()
            .with_outer_iterations(60)
            .with_temperatures(5.0, 1e-4)
            .with_seed(42);
        let mut sa = Annealing::new(3, config).unwrap();
        sa.evolve(&mut pop).unwrap();

        let after = pop.best().unwrap().fitness()[0];
        assert!(after < before);
        assert!(after < 0.5, "expected near-zero cost, got {after}");
        assert_eq!(pop.len(), 8);
        let stats = sa.last_stats().unwrap();
        assert!(stats.improved);
        assert_eq!(stats.evaluations, 60 * 20 * 3);
        assert!((stats.final_temperature - 1e-4).abs() < 1e-9);
    }

    #[test]
    fn test_zero_outer_iterations_keeps_best() {
        let mut pop = population(sphere(2), 6, 3);
        let before = pop.best().unwrap().clone();
        let mut sa = Annealing::new(
            2,
            AnnealingConfig::default().with_outer_iterations(0).with_seed(1),
        )
        .unwrap();
        sa.evolve(&mut pop).unwrap();

        assert_eq!(pop.best().unwrap(), &before);
        assert_eq!(sa.last_stats().unwrap().evaluations, 0);
        assert!(!sa.last_stats().unwrap().improved);
    }

    #[test]
    fn test_full_acceptance_grows_steps() {
        let mut pop = population(flat(2), 3, 5);
        let config = AnnealingConfig::default()
            .with_outer_iterations(1)
            .with_iterations_per_temperature(1)
            .with_iterations_per_adaptation(5)
            .with_start_step(0.1)
            .with_seed(11);
        let mut sa = Annealing::new(2, config).unwrap();
        sa.evolve(&mut pop).unwrap();

        let stats = sa.last_stats().unwrap();
        assert_eq!(stats.acceptance_history.len(), 1);
        assert!(stats.acceptance_history[0].iter().all(|&r| r == 1.0));
        assert!(stats.steps.iter().all(|&s| s > 0.1));
        assert_eq!(stats.acceptance_ratio(), 1.0);
    }

    #[test]
    fn test_adapt_steps_rules() {
        let mut steps = vec![0.2, 0.2, 0.2, 0.9];
        let mut accepted = vec![10, 5, 0, 10];
        let ratios = adapt_steps(&mut steps, &mut accepted, 10);
        assert_eq!(ratios, vec![1.0, 0.5, 0.0, 1.0]);
        assert!((steps[0] - 0.6).abs() < 1e-12);
        assert_eq!(steps[1], 0.2);
        assert!((steps[2] - 0.2 / 3.0).abs() < 1e-12);
        assert_eq!(steps[3], MAX_STEP);
        assert_eq!(accepted, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut pop = population(sphere(3), 4, 2);
        let mut sa = Annealing::new(2, AnnealingConfig::default()).unwrap();
        let err = sa.evolve(&mut pop).unwrap_err();
        assert!(err.is_invalid_population());
    }

    #[test]
    fn test_empty_population_rejected() {
        let mut pop = Population::new(sphere(2));
        let mut sa = Annealing::new(2, AnnealingConfig::default()).unwrap();
        assert!(sa.evolve(&mut pop).unwrap_err().is_invalid_population());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Annealing::new(2, AnnealingConfig::default().with_start_step(2.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let config = AnnealingConfig::default()
            .with_outer_iterations(10)
            .with_seed(99);
        let mut a = population(sphere(2), 5, 4);
        let mut b = a.clone();
        Annealing::new(2, config.clone()).unwrap().evolve(&mut a).unwrap();
        Annealing::new(2, config).unwrap().evolve(&mut b).unwrap();
        let xa: Vec<_> = a.iter().map(|i| i.x().to_vec()).collect();
        let xb: Vec<_> = b.iter().map(|i| i.x().to_vec()).collect();
        assert_eq!(xa, xb);
    }

    #[test]
    fn test_constrained_walk_prefers_feasible() {
        let problem: Arc<dyn Problem> = Arc::new(
            FnProblem::new(Bounds::uniform(2, -2.0, 2.0).unwrap(), |x| Ok(x[0] + x[1]))
                .with_inequalities(1, |x, c| {
                    c[0] = 1.0 - x[0] - x[1];
                    Ok(())
                }),
        );
        let mut pop = population(problem, 6, 8);
        let mut sa = Annealing::new(
            2,
            AnnealingConfig::default()
                .with_outer_iterations(40)
                .with_seed(3),
        )
        .unwrap();
        sa.evolve(&mut pop).unwrap();
        let best = pop.best().unwrap();
        assert!(best.is_feasible());
        assert!(best.fitness()[0] < 1.2);
    }

    #[test]
    fn test_evaluation_error_reaches_caller() {
        let problem: Arc<dyn Problem> = Arc::new(FnProblem::new(Bounds::uniform(1, -1.0, 1.0).unwrap(), |x| {
            if x[0] > 0.5 {
                return Err(EvaluationError::new("simulation diverged"));
            }
            Ok(x[0] * x[0])
        }));
        let mut pop = Population::new(problem);
        pop.push(vec![-1.0]).unwrap();
        pop.push(vec![-0.5]).unwrap();

        let mut sa = Annealing::new(1, AnnealingConfig::default().with_seed(7)).unwrap();
        match sa.evolve(&mut pop) {
            Err(Error::Evaluation(e)) => assert_eq!(e, EvaluationError::new("simulation diverged")),
            other => panic!("expected an evaluation error, got {other:?}"),
        }
        assert_eq!(pop.len(), 2);
        assert!(pop.iter().all(|i| i.x()[0] <= 0.5));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_evolve_preserves_size_and_bounds(size in 1usize..8, seed in 0u64..1000) {
            let mut pop = population(sphere(2), size, seed);
            let mut sa = Annealing::new(
                2,
                AnnealingConfig::default().with_outer_iterations(3).with_seed(seed),
            )
            .unwrap();
            sa.evolve(&mut pop).unwrap();
            prop_assert_eq!(pop.len(), size);
            for ind in &pop {
                prop_assert!(pop.problem().bounds().contains(ind.x()));
            }
        }
    }
}
