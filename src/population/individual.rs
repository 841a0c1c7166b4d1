//! Candidate solutions with cached evaluations.

use crate::error::{Error, Result};
use crate::problem::Problem;
use std::cmp::Ordering;

/// One candidate solution: a decision vector plus the fitness and
/// constraint values computed from it.
///
/// The decision vector can only be set through methods that evaluate the
/// problem, so the cached values always belong to the current vector.
/// The individual also remembers which problem instance produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    x: Vec<f64>,
    fitness: Vec<f64>,
    constraints: Vec<f64>,
    violation: f64,
    origin: usize,
}

/// Address of the problem object, stable while the problem is alive.
fn problem_address(problem: &dyn Problem) -> usize {
    problem as *const dyn Problem as *const () as usize
}

impl Individual {
    /// Evaluates `x` on `problem`.
    ///
    /// Fails with [`Error::InvalidPopulation`] when `x` has the wrong length
    /// or leaves the bounds.
    pub fn evaluate(problem: &dyn Problem, x: Vec<f64>) -> Result<Self> {
        if x.len() != problem.dimension() {
            return Err(Error::InvalidPopulation(format!(
                "decision vector has length {}, problem dimension is {}",
                x.len(),
                problem.dimension()
            )));
        }
        if !problem.bounds().contains(&x) {
            return Err(Error::InvalidPopulation(format!(
                "decision vector {x:?} lies outside the problem bounds"
            )));
        }
        let eval = problem.evaluate(&x)?;
        let violation = problem.violation(&eval.constraints);
        Ok(Self {
            x,
            fitness: eval.fitness,
            constraints: eval.constraints,
            violation,
            origin: problem_address(problem),
        })
    }

    /// Replaces the decision vector and re-evaluates.
    ///
    /// On failure the individual is left unchanged.
    pub fn set_x(&mut self, problem: &dyn Problem, x: Vec<f64>) -> Result<()> {
        *self = Self::evaluate(problem, x)?;
        Ok(())
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn constraints(&self) -> &[f64] {
        &self.constraints
    }

    /// Total constraint violation, zero when feasible.
    pub fn violation(&self) -> f64 {
        self.violation
    }

    pub fn is_feasible(&self) -> bool {
        self.violation == 0.0
    }

    /// Total order: lower violation first, then lower fitness
    /// (lexicographic over objectives).
    pub fn compare(&self, other: &Self) -> Ordering {
        self.violation
            .total_cmp(&other.violation)
            .then_with(|| {
                self.fitness
                    .iter()
                    .zip(&other.fitness)
                    .map(|(a, b)| a.total_cmp(b))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
    }

    /// Whether the cached values were computed by this `problem` instance.
    pub fn evaluated_on(&self, problem: &dyn Problem) -> bool {
        self.origin == problem_address(problem)
    }

    /// Whether `self` ranks strictly ahead of `other`.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Less
    }
}
