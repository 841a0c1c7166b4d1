//! C ABI spoken by foreign local solvers.
//!
//! Two calling conventions are supported:
//!
//! - **Derivative-free** ([`LocalRequest`]): one function-pointer signature
//!   for the objective and for every scalar constraint,
//!   `f(n, x, grad, data) -> f64`. `grad` may be null. Constraints are
//!   feasible when `g(x) <= tol`.
//! - **Gradient** ([`GradientRequest`]): separate `f`, `df` and `fdf`
//!   pointers over strided [`RawVector`]s sharing one `params` pointer.
//!
//! Both entry points receive the starting point in `x`, overwrite it with
//! the solver's result and return a [`RawOutcome`].

use std::ffi::{c_int, c_uint, c_void};

/// Objective or constraint callback of the derivative-free convention.
pub type RawFunc =
    unsafe extern "C" fn(n: c_uint, x: *const f64, grad: *mut f64, data: *mut c_void) -> f64;

/// One scalar inequality constraint `func(x) <= tol`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawConstraint {
    pub func: RawFunc,
    pub data: *mut c_void,
    pub tol: f64,
}

/// Problem handed to a derivative-free entry point.
#[repr(C)]
#[derive(Debug)]
pub struct LocalRequest {
    pub n: c_uint,
    pub lower: *const f64,
    pub upper: *const f64,
    pub objective: RawFunc,
    pub objective_data: *mut c_void,
    /// `constraint_count` entries, or null when there are none.
    pub constraints: *const RawConstraint,
    pub constraint_count: c_uint,
    pub max_iter: c_uint,
    pub tol: f64,
    pub variant: c_int,
}

/// Strided view over `size` doubles.
#[repr(C)]
#[derive(Debug)]
pub struct RawVector {
    pub size: usize,
    pub stride: usize,
    pub data: *mut f64,
}

impl RawVector {
    /// A contiguous view over `values`.
    pub fn contiguous(values: &mut [f64]) -> Self {
        Self {
            size: values.len(),
            stride: 1,
            data: values.as_mut_ptr(),
        }
    }

    /// Reads element `i`.
    ///
    /// # Safety
    /// `i < size` and `data` valid for `size * stride` reads.
    pub unsafe fn get(&self, i: usize) -> f64 {
        *self.data.add(i * self.stride)
    }

    /// Writes element `i`.
    ///
    /// # Safety
    /// `i < size` and `data` valid for `size * stride` writes.
    pub unsafe fn set(&mut self, i: usize, value: f64) {
        *self.data.add(i * self.stride) = value;
    }
}

/// Objective of the gradient convention.
pub type GradF = unsafe extern "C" fn(x: *const RawVector, params: *mut c_void) -> f64;
/// Gradient of the gradient convention.
pub type GradDf = unsafe extern "C" fn(x: *const RawVector, params: *mut c_void, g: *mut RawVector);
/// Objective and gradient in one call.
pub type GradFdf =
    unsafe extern "C" fn(x: *const RawVector, params: *mut c_void, f: *mut f64, g: *mut RawVector);

/// Function bundle of the gradient convention.
#[repr(C)]
#[derive(Debug)]
pub struct GradientFunction {
    pub f: GradF,
    pub df: GradDf,
    pub fdf: GradFdf,
    pub n: usize,
    pub params: *mut c_void,
}

/// Problem handed to a gradient entry point.
#[repr(C)]
#[derive(Debug)]
pub struct GradientRequest {
    pub function: GradientFunction,
    pub lower: *const f64,
    pub upper: *const f64,
    /// Length of the first trial step.
    pub step_size: f64,
    /// Line-search accuracy.
    pub tol: f64,
    /// Gradient norm under which the solver stops.
    pub grad_tol: f64,
    pub max_iter: c_uint,
    pub variant: c_int,
}

/// Result of a foreign solve.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawOutcome {
    pub status: c_int,
    pub iterations: c_uint,
    /// Objective value at the returned point.
    pub value: f64,
}

impl RawOutcome {
    pub fn new(status: c_int, iterations: c_uint, value: f64) -> Self {
        Self {
            status,
            iterations,
            value,
        }
    }
}

/// Derivative-free entry point.
pub type LocalEntry = unsafe extern "C" fn(request: *const LocalRequest, x: *mut f64) -> RawOutcome;

/// Gradient entry point.
pub type GradientEntry =
    unsafe extern "C" fn(request: *const GradientRequest, x: *mut f64) -> RawOutcome;

/// Raw status codes.
pub mod status {
    use std::ffi::c_int;

    pub const SUCCESS: c_int = 1;
    pub const FTOL_REACHED: c_int = 3;
    pub const XTOL_REACHED: c_int = 4;
    pub const MAXITER_REACHED: c_int = 5;
    pub const GRADIENT_REACHED: c_int = 7;
    pub const FAILURE: c_int = -1;
    pub const INVALID_ARGS: c_int = -2;
    pub const ROUNDOFF: c_int = -4;
    pub const FORCED_STOP: c_int = -5;
}

/// Raw variant selectors.
pub mod variant {
    use std::ffi::c_int;

    pub const COMPASS: c_int = 0;
    pub const FLETCHER_REEVES: c_int = 0;
    pub const POLAK_RIBIERE: c_int = 1;
}

/// Typed view of a raw status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverStatus {
    Success,
    FtolReached,
    XtolReached,
    GradientReached,
    MaxIterReached,
    Failure,
    InvalidArgs,
    Roundoff,
    ForcedStop,
    Unknown(i32),
}

impl SolverStatus {
    pub fn from_raw(code: c_int) -> Self {
        match code {
            status::SUCCESS => Self::Success,
            status::FTOL_REACHED => Self::FtolReached,
            status::XTOL_REACHED => Self::XtolReached,
            status::GRADIENT_REACHED => Self::GradientReached,
            status::MAXITER_REACHED => Self::MaxIterReached,
            status::FAILURE => Self::Failure,
            status::INVALID_ARGS => Self::InvalidArgs,
            status::ROUNDOFF => Self::Roundoff,
            status::FORCED_STOP => Self::ForcedStop,
            other => Self::Unknown(other),
        }
    }

    /// Whether the solver converged.
    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::Success | Self::FtolReached | Self::XtolReached | Self::GradientReached
        )
    }
}
