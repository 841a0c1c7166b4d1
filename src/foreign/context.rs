//! Callback state and shims marshaling foreign calls into a [`Problem`].
//!
//! A [`CallbackContext`] is built on the stack right before a foreign call,
//! handed to the solver as an opaque pointer and dropped right after the
//! call returns. Shims recover it from the pointer, evaluate the problem and
//! write results in the layout the solver expects. Errors and panics raised
//! by the problem are recorded in the context and surfaced after the call;
//! nothing unwinds across the ABI.

use super::abi::{RawConstraint, RawFunc, RawVector};
use crate::algorithm::panic_message;
use crate::error::{Error, EvaluationError};
use crate::problem::Problem;
use std::cell::RefCell;
use std::ffi::{c_uint, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::slice;

/// Runs one problem call, turning a panic into [`Error::WorkerPanic`].
fn guarded(call: impl FnOnce() -> Result<(), EvaluationError>) -> Result<(), Error> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result.map_err(Error::from),
        Err(payload) => Err(Error::WorkerPanic(panic_message(payload.as_ref()))),
    }
}

/// Mutable state shared by every shim during one foreign call.
pub(crate) struct CallbackContext<'a> {
    problem: &'a dyn Problem,
    numdiff_step: f64,
    /// Scratch copy of the point being evaluated, projected onto the bounds.
    x: Vec<f64>,
    fitness: Vec<f64>,
    constraints: Vec<f64>,
    /// Point the `constraints` buffer was computed for.
    constraints_for: Option<Vec<f64>>,
    pub(crate) objective_calls: usize,
    pub(crate) constraint_evaluations: usize,
    pub(crate) error: Option<Error>,
}

impl<'a> CallbackContext<'a> {
    pub(crate) fn new(problem: &'a dyn Problem, numdiff_step: f64) -> Self {
        Self {
            problem,
            numdiff_step,
            x: vec![0.0; problem.dimension()],
            fitness: vec![0.0; problem.objective_count()],
            constraints: vec![0.0; problem.constraint_count()],
            constraints_for: None,
            objective_calls: 0,
            constraint_evaluations: 0,
            error: None,
        }
    }

    fn load(&mut self, x: &[f64]) {
        self.x.copy_from_slice(x);
        self.problem.bounds().clamp(&mut self.x);
    }

    fn record(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// First objective of `x`, or NaN after recording a failure.
    pub(crate) fn objective(&mut self, x: &[f64]) -> f64 {
        self.load(x);
        self.objective_calls += 1;
        let (problem, point, fitness) = (self.problem, &self.x, &mut self.fitness);
        match guarded(|| problem.objective(point, fitness)) {
            Ok(()) => self.fitness[0],
            Err(e) => {
                self.record(e);
                f64::NAN
            }
        }
    }

    /// Component `i` of the constraint vector of `x`, converted to the
    /// `g(x) <= tol` convention: equalities are reported as `|c_i(x)|`.
    ///
    /// The full vector is evaluated once per distinct `x`.
    pub(crate) fn constraint(&mut self, x: &[f64], i: usize) -> f64 {
        if self.constraints_for.as_deref() != Some(x) {
            self.load(x);
            self.constraint_evaluations += 1;
            let (problem, point, values) = (self.problem, &self.x, &mut self.constraints);
            if let Err(e) = guarded(|| problem.constraints(point, values)) {
                self.constraints_for = None;
                self.record(e);
                return f64::NAN;
            }
            self.constraints_for = Some(x.to_vec());
        }
        let value = self.constraints[i];
        if i < self.problem.equality_constraints() {
            value.abs()
        } else {
            value
        }
    }

    /// Finite-difference gradient of `f` at `x` written into `grad`.
    ///
    /// Central differences inside the bounds, one-sided against them.
    pub(crate) fn gradient<F>(&mut self, x: &[f64], grad: &mut [f64], mut f: F)
    where
        F: FnMut(&mut Self, &[f64]) -> f64,
    {
        let bounds = self.problem.bounds();
        let (lower, upper) = (bounds.lower().to_vec(), bounds.upper().to_vec());
        let h = self.numdiff_step;
        let mut probe = x.to_vec();
        for i in 0..x.len() {
            let up = (x[i] + h).min(upper[i]);
            let down = (x[i] - h).max(lower[i]);
            if up - down <= 0.0 {
                grad[i] = 0.0;
                continue;
            }
            probe[i] = up;
            let f_up = f(self, &probe);
            probe[i] = down;
            let f_down = f(self, &probe);
            probe[i] = x[i];
            grad[i] = (f_up - f_down) / (up - down);
        }
    }
}

/// Context pointer plus the constraint component a callback reports.
pub(crate) struct ConstraintSlot<'a, 'p> {
    context: &'a RefCell<CallbackContext<'p>>,
    component: usize,
}

impl<'a, 'p> ConstraintSlot<'a, 'p> {
    /// One slot per constraint component of the context's problem.
    pub(crate) fn for_all(context: &'a RefCell<CallbackContext<'p>>, count: usize) -> Vec<Self> {
        (0..count)
            .map(|component| Self { context, component })
            .collect()
    }

    /// Raw descriptor pointing at this slot.
    pub(crate) fn raw(&self, tol: f64) -> RawConstraint {
        RawConstraint {
            func: constraint_shim,
            data: self as *const Self as *mut c_void,
            tol,
        }
    }
}

/// Opaque pointer to a context for the objective callbacks.
pub(crate) fn context_ptr(context: &RefCell<CallbackContext<'_>>) -> *mut c_void {
    context as *const RefCell<CallbackContext<'_>> as *mut c_void
}

/// Derivative-free objective shim.
pub(crate) const OBJECTIVE_SHIM: RawFunc = objective_shim;

unsafe extern "C" fn objective_shim(
    n: c_uint,
    x: *const f64,
    grad: *mut f64,
    data: *mut c_void,
) -> f64 {
    let cell = &*(data as *const RefCell<CallbackContext<'_>>);
    let Ok(mut ctx) = cell.try_borrow_mut() else {
        return f64::NAN;
    };
    let x = slice::from_raw_parts(x, n as usize);
    if !grad.is_null() {
        let grad = slice::from_raw_parts_mut(grad, n as usize);
        ctx.gradient(x, grad, |c, p| c.objective(p));
    }
    ctx.objective(x)
}

unsafe extern "C" fn constraint_shim(
    n: c_uint,
    x: *const f64,
    grad: *mut f64,
    data: *mut c_void,
) -> f64 {
    let slot = &*(data as *const ConstraintSlot<'_, '_>);
    let Ok(mut ctx) = slot.context.try_borrow_mut() else {
        return f64::NAN;
    };
    let x = slice::from_raw_parts(x, n as usize);
    if !grad.is_null() {
        let grad = slice::from_raw_parts_mut(grad, n as usize);
        let component = slot.component;
        ctx.gradient(x, grad, |c, p| c.constraint(p, component));
    }
    ctx.constraint(x, slot.component)
}

fn read_vector(v: &RawVector) -> Vec<f64> {
    (0..v.size).map(|i| unsafe { v.get(i) }).collect()
}

fn write_vector(v: &mut RawVector, values: &[f64]) {
    for (i, &value) in values.iter().enumerate().take(v.size) {
        unsafe { v.set(i, value) };
    }
}

/// Gradient-convention objective shim.
pub(crate) unsafe extern "C" fn grad_f_shim(x: *const RawVector, params: *mut c_void) -> f64 {
    let cell = &*(params as *const RefCell<CallbackContext<'_>>);
    let Ok(mut ctx) = cell.try_borrow_mut() else {
        return f64::NAN;
    };
    let x = read_vector(&*x);
    ctx.objective(&x)
}

/// Gradient-convention gradient shim.
pub(crate) unsafe extern "C" fn grad_df_shim(
    x: *const RawVector,
    params: *mut c_void,
    g: *mut RawVector,
) {
    let cell = &*(params as *const RefCell<CallbackContext<'_>>);
    let Ok(mut ctx) = cell.try_borrow_mut() else {
        return;
    };
    let x = read_vector(&*x);
    let mut grad = vec![0.0; x.len()];
    ctx.gradient(&x, &mut grad, |c, p| c.objective(p));
    write_vector(&mut *g, &grad);
}

/// Gradient-convention combined shim.
pub(crate) unsafe extern "C" fn grad_fdf_shim(
    x: *const RawVector,
    params: *mut c_void,
    f: *mut f64,
    g: *mut RawVector,
) {
    let cell = &*(params as *const RefCell<CallbackContext<'_>>);
    let Ok(mut ctx) = cell.try_borrow_mut() else {
        *f = f64::NAN;
        return;
    };
    let x = read_vector(&*x);
    let mut grad = vec![0.0; x.len()];
    ctx.gradient(&x, &mut grad, |c, p| c.objective(p));
    write_vector(&mut *g, &grad);
    *f = ctx.objective(&x);
}
