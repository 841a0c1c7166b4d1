//! Annealing configuration.

/// Configuration for adaptive simulated annealing.
///
/// The walk runs three nested loops:
///
/// - `outer_iterations` temperature levels. The temperature starts at
///   `initial_temperature` and is multiplied by a coefficient after every
///   level so that it reaches `final_temperature` after the last one.
/// - `iterations_per_temperature` adaptation windows per level.
/// - `iterations_per_adaptation` sweeps per window. A sweep perturbs every
///   component once. At the end of the window each component's step size
///   grows or shrinks with its acceptance ratio.
///
/// Step sizes are fractions of each component's bound width.
///
/// # References
///
/// Corana, Marchesi, Martini & Ridella (1987), "Minimizing multimodal
/// functions of continuous variables with the simulated annealing algorithm"
///
/// # Examples
///
/// ```
/// use u_globopt::sa::AnnealingConfig;
///
/// let config = AnnealingConfig::default()
///     .with_outer_iterations(50)
///     .with_temperatures(10.0, 0.01)
///     .with_start_step(0.5)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnealingConfig {
    /// Number of temperature levels.
    pub outer_iterations: usize,

    /// Adaptation windows per temperature level.
    pub iterations_per_temperature: usize,

    /// Sweeps per adaptation window.
    pub iterations_per_adaptation: usize,

    /// Temperature of the first level.
    pub initial_temperature: f64,

    /// Temperature reached after the last level.
    pub final_temperature: f64,

    /// Initial step size as a fraction of each bound width, in (0, 1].
    pub start_step: f64,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            outer_iterations: 100,
            iterations_per_temperature: 1,
            iterations_per_adaptation: 20,
            initial_temperature: 10.0,
            final_temperature: 0.1,
            start_step: 1.0,
            seed: None,
        }
    }
}

impl AnnealingConfig {
    /// Derives the outer iteration count from a total evaluation budget.
    ///
    /// Each outer iteration costs
    /// `iterations_per_temperature * iterations_per_adaptation * dimension`
    /// evaluations with the default inner counts.
    pub fn from_budget(
        evaluations: usize,
        dimension: usize,
        initial_temperature: f64,
        final_temperature: f64,
    ) -> Self {
        let base = Self::default();
        let per_outer =
            (base.iterations_per_temperature * base.iterations_per_adaptation * dimension).max(1);
        Self {
            outer_iterations: evaluations / per_outer,
            initial_temperature,
            final_temperature,
            ..base
        }
    }

    pub fn with_outer_iterations(mut self, n: usize) -> Self {
        self.outer_iterations = n;
        self
    }

    pub fn with_iterations_per_temperature(mut self, n: usize) -> Self {
        self.iterations_per_temperature = n;
        self
    }

    pub fn with_iterations_per_adaptation(mut self, n: usize) -> Self {
        self.iterations_per_adaptation = n;
        self
    }

    pub fn with_temperatures(mut self, initial: f64, last: f64) -> Self {
        self.initial_temperature = initial;
        self.final_temperature = last;
        self
    }

    pub fn with_start_step(mut self, step: f64) -> Self {
        self.start_step = step;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Geometric decay applied after each outer iteration.
    pub fn temperature_coefficient(&self) -> f64 {
        if self.outer_iterations == 0 {
            return 1.0;
        }
        (self.final_temperature / self.initial_temperature).powf(1.0 / self.outer_iterations as f64)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.initial_temperature > 0.0 && self.initial_temperature.is_finite()) {
            return Err("initial_temperature must be positive".into());
        }
        if !(self.final_temperature > 0.0) {
            return Err("final_temperature must be positive".into());
        }
        if self.final_temperature > self.initial_temperature {
            return Err("final_temperature must not exceed initial_temperature".into());
        }
        if self.iterations_per_temperature == 0 {
            return Err("iterations_per_temperature must be at least 1".into());
        }
        if self.iterations_per_adaptation == 0 {
            return Err("iterations_per_adaptation must be at least 1".into());
        }
        if !(self.start_step > 0.0 && self.start_step <= 1.0) {
            return Err(format!("start_step must be in (0, 1], got {}", self.start_step));
        }
        Ok(())
    }
}
