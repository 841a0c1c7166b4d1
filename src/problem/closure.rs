//! Closure-backed problems.

use super::types::{Bounds, Problem};
use crate::error::EvaluationError;

type ScalarFn = dyn Fn(&[f64]) -> Result<f64, EvaluationError> + Send + Sync;
type VectorFn = dyn Fn(&[f64], &mut [f64]) -> Result<(), EvaluationError> + Send + Sync;

/// A single-objective problem defined by closures.
///
/// # Examples
///
/// ```
/// use u_globopt::problem::{Bounds, FnProblem, Problem};
///
/// let problem = FnProblem::new(Bounds::uniform(2, -5.0, 5.0).unwrap(), |x| {
///     Ok(x.iter().map(|v| v * v).sum())
/// })
/// .with_inequalities(1, |x, c| {
///     c[0] = 1.0 - x[0];
///     Ok(())
/// });
///
/// assert_eq!(problem.constraint_count(), 1);
/// ```
pub struct FnProblem {
    bounds: Bounds,
    objective: Box<ScalarFn>,
    equalities: Option<(usize, Box<VectorFn>)>,
    inequalities: Option<(usize, Box<VectorFn>)>,
    tolerance: f64,
}

impl FnProblem {
    pub fn new<F>(bounds: Bounds, objective: F) -> Self
    where
        F: Fn(&[f64]) -> Result<f64, EvaluationError> + Send + Sync + 'static,
    {
        Self {
            bounds,
            objective: Box::new(objective),
            equalities: None,
            inequalities: None,
            tolerance: 0.0,
        }
    }

    /// Adds `count` equality constraints `c_i(x) = 0`.
    pub fn with_equalities<G>(mut self, count: usize, g: G) -> Self
    where
        G: Fn(&[f64], &mut [f64]) -> Result<(), EvaluationError> + Send + Sync + 'static,
    {
        self.equalities = Some((count, Box::new(g)));
        self
    }

    /// Adds `count` inequality constraints `c_i(x) <= 0`.
    pub fn with_inequalities<G>(mut self, count: usize, g: G) -> Self
    where
        G: Fn(&[f64], &mut [f64]) -> Result<(), EvaluationError> + Send + Sync + 'static,
    {
        self.inequalities = Some((count, Box::new(g)));
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl Problem for FnProblem {
    fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    fn objective(&self, x: &[f64], f: &mut [f64]) -> Result<(), EvaluationError> {
        f[0] = (self.objective)(x)?;
        Ok(())
    }

    fn constraints(&self, x: &[f64], c: &mut [f64]) -> Result<(), EvaluationError> {
        let (eq, ineq) = c.split_at_mut(self.equality_constraints());
        if let Some((_, g)) = &self.equalities {
            g(x, eq)?;
        }
        if let Some((_, g)) = &self.inequalities {
            g(x, ineq)?;
        }
        Ok(())
    }

    fn equality_constraints(&self) -> usize {
        self.equalities.as_ref().map_or(0, |(n, _)| *n)
    }

    fn inequality_constraints(&self) -> usize {
        self.inequalities.as_ref().map_or(0, |(n, _)| *n)
    }

    fn constraint_tolerance(&self) -> f64 {
        self.tolerance
    }
}
