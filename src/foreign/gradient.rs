//! Gradient-based foreign solver wrapper.

use super::abi::{GradientEntry, GradientFunction, GradientRequest};
use super::config::GradientConfig;
use super::context::{context_ptr, grad_df_shim, grad_f_shim, grad_fdf_shim, CallbackContext};
use super::outcome::settle;
use super::reference::u_globopt_conjugate_gradient;
use crate::algorithm::{check_population, Algorithm};
use crate::error::{Error, Result};
use crate::population::Population;
use std::cell::RefCell;
use std::sync::Arc;
use tracing::debug;

/// Runs one gradient-based local solve from the best member of the
/// population. Gradients come from finite differences of the objective.
///
/// Only unconstrained single-objective problems are accepted.
#[derive(Debug, Clone)]
pub struct GradientWrapper {
    config: GradientConfig,
    entry: GradientEntry,
}

impl GradientWrapper {
    /// Wrapper around the bundled conjugate gradient solver.
    pub fn new(config: GradientConfig) -> Result<Self> {
        // SAFETY: the reference solver honors the request contract.
        unsafe { Self::with_entry(config, u_globopt_conjugate_gradient) }
    }

    /// Wrapper around an external entry point.
    ///
    /// # Safety
    ///
    /// `entry` must read the request only during the call, keep `x` within
    /// `function.n` elements and invoke the callbacks only with valid
    /// vectors of that size from the calling thread.
    pub unsafe fn with_entry(config: GradientConfig, entry: GradientEntry) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        Ok(Self { config, entry })
    }

    pub fn config(&self) -> &GradientConfig {
        &self.config
    }
}

impl Algorithm for GradientWrapper {
    fn evolve(&mut self, population: &mut Population) -> Result<()> {
        check_population(population, None)?;
        let problem = Arc::clone(population.problem());
        if problem.objective_count() != 1 || problem.is_constrained() {
            return Err(Error::InvalidPopulation(
                "gradient solvers need an unconstrained single-objective problem".into(),
            ));
        }
        let start = population
            .best()
            .cloned()
            .ok_or_else(|| Error::InvalidPopulation("population is empty".into()))?;

        let bounds = problem.bounds();
        let mut x = start.x().to_vec();
        let context = RefCell::new(CallbackContext::new(problem.as_ref(), self.config.numdiff_step));
        let request = GradientRequest {
            function: GradientFunction {
                f: grad_f_shim,
                df: grad_df_shim,
                fdf: grad_fdf_shim,
                n: problem.dimension(),
                params: context_ptr(&context),
            },
            lower: bounds.lower().as_ptr(),
            upper: bounds.upper().as_ptr(),
            step_size: self.config.step_size,
            tol: self.config.tolerance,
            grad_tol: self.config.grad_tolerance,
            max_iter: self.config.max_iterations,
            variant: self.config.variant.raw(),
        };
        // SAFETY: request and context outlive the call; x holds n values.
        let outcome = unsafe { (self.entry)(&request, x.as_mut_ptr()) };

        let context = context.into_inner();
        debug!(objective_calls = context.objective_calls, "gradient callbacks");
        if let Some(err) = context.error {
            return Err(err);
        }
        settle(population, &start, x, outcome, self.name())
    }

    fn name(&self) -> &str {
        "gradient"
    }

    fn describe(&self) -> String {
        format!(
            "gradient(variant={:?}, max_iterations={}, grad_tolerance={:e})",
            self.config.variant, self.config.max_iterations, self.config.grad_tolerance
        )
    }

    fn clone_box(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }
}
