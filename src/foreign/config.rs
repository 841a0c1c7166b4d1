//! Foreign solver configuration.

use super::abi::variant;
use std::ffi::c_int;

/// Derivative-free algorithm selected inside the foreign library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocalVariant {
    /// Compass search, understood by the bundled reference solver.
    Compass,
    /// Library-specific selector passed through unchanged.
    Custom(i32),
}

impl LocalVariant {
    pub fn raw(self) -> c_int {
        match self {
            Self::Compass => variant::COMPASS,
            Self::Custom(code) => code,
        }
    }
}

/// Conjugate gradient update formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GradientVariant {
    FletcherReeves,
    PolakRibiere,
}

impl GradientVariant {
    pub fn raw(self) -> c_int {
        match self {
            Self::FletcherReeves => variant::FLETCHER_REEVES,
            Self::PolakRibiere => variant::POLAK_RIBIERE,
        }
    }
}

/// Configuration for [`LocalWrapper`](super::LocalWrapper).
///
/// # Examples
///
/// ```
/// use u_globopt::foreign::LocalConfig;
///
/// let config = LocalConfig::default()
///     .with_constrained(true)
///     .with_max_iterations(500)
///     .with_tolerance(1e-8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalConfig {
    /// Whether constraints are forwarded to the solver. Constrained problems
    /// are rejected when this is off.
    pub constrained: bool,

    /// Iteration limit handed to the solver.
    pub max_iterations: u32,

    /// Stopping tolerance on the decision vector.
    pub tolerance: f64,

    pub variant: LocalVariant,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            constrained: false,
            max_iterations: 1000,
            tolerance: 1e-6,
            variant: LocalVariant::Compass,
        }
    }
}

impl LocalConfig {
    pub fn with_constrained(mut self, constrained: bool) -> Self {
        self.constrained = constrained;
        self
    }

    pub fn with_max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_variant(mut self, variant: LocalVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err("tolerance must be positive and finite".into());
        }
        Ok(())
    }
}

/// Configuration for [`GradientWrapper`](super::GradientWrapper).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradientConfig {
    pub max_iterations: u32,

    /// Gradient norm under which the solver stops.
    pub grad_tolerance: f64,

    /// Step of the finite-difference gradient.
    pub numdiff_step: f64,

    /// Length of the first trial step.
    pub step_size: f64,

    /// Line-search accuracy, in `(0, 1)`.
    pub tolerance: f64,

    pub variant: GradientVariant,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            grad_tolerance: 1e-8,
            numdiff_step: 1e-8,
            step_size: 0.01,
            tolerance: 1e-4,
            variant: GradientVariant::FletcherReeves,
        }
    }
}

impl GradientConfig {
    pub fn with_max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_grad_tolerance(mut self, tol: f64) -> Self {
        self.grad_tolerance = tol;
        self
    }

    pub fn with_numdiff_step(mut self, h: f64) -> Self {
        self.numdiff_step = h;
        self
    }

    pub fn with_step_size(mut self, step: f64) -> Self {
        self.step_size = step;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_variant(mut self, variant: GradientVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if !(self.grad_tolerance >= 0.0) {
            return Err("grad_tolerance must be non-negative".into());
        }
        if !(self.numdiff_step > 0.0 && self.numdiff_step.is_finite()) {
            return Err("numdiff_step must be positive and finite".into());
        }
        if !(self.step_size > 0.0 && self.step_size.is_finite()) {
            return Err("step_size must be positive and finite".into());
        }
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return Err("tolerance must lie in (0, 1)".into());
        }
        Ok(())
    }
}
