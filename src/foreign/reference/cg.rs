//! Nonlinear conjugate gradient behind the gradient ABI.

use crate::foreign::abi::{status, variant, GradientFunction, GradientRequest, RawOutcome, RawVector};
use std::slice;

/// Smallest step the line search tries before giving up.
const MIN_ALPHA: f64 = 1e-20;

struct Oracle<'a> {
    function: &'a GradientFunction,
}

impl Oracle<'_> {
    unsafe fn f(&self, x: &mut [f64]) -> f64 {
        let xv = RawVector::contiguous(x);
        (self.function.f)(&xv, self.function.params)
    }

    unsafe fn fdf(&self, x: &mut [f64], g: &mut [f64]) -> f64 {
        let xv = RawVector::contiguous(x);
        let mut gv = RawVector::contiguous(g);
        let mut f = f64::NAN;
        (self.function.fdf)(&xv, self.function.params, &mut f, &mut gv);
        f
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Norm of the gradient with components pushing against an active bound removed.
fn projected_norm(x: &[f64], g: &[f64], lower: &[f64], upper: &[f64]) -> f64 {
    x.iter()
        .zip(g)
        .enumerate()
        .map(|(i, (&xi, &gi))| {
            if (xi <= lower[i] && gi > 0.0) || (xi >= upper[i] && gi < 0.0) {
                0.0
            } else {
                gi * gi
            }
        })
        .sum::<f64>()
        .sqrt()
}

/// Fletcher–Reeves / Polak–Ribière conjugate gradient with a backtracking
/// Armijo line search, projected onto the bounds.
///
/// `step_size` is the length of the first trial step; it doubles after a
/// step accepted on the first try and halves otherwise. `tol` is the
/// sufficient-decrease constant of the line search. Stops with
/// `GRADIENT_REACHED` once the projected gradient norm drops below
/// `grad_tol`, with `ROUNDOFF` when no step makes progress, and with
/// `MAXITER_REACHED` after `max_iter` iterations. Directions restart with
/// steepest descent every `n` iterations or when they stop descending.
///
/// # Safety
///
/// `request` must point to a valid [`GradientRequest`] whose bound arrays
/// hold `function.n` values; `x` must be valid for `function.n` reads and
/// writes.
#[no_mangle]
pub unsafe extern "C" fn u_globopt_conjugate_gradient(
    request: *const GradientRequest,
    x: *mut f64,
) -> RawOutcome {
    let Some(req) = request.as_ref() else {
        return RawOutcome::new(status::INVALID_ARGS, 0, f64::NAN);
    };
    let n = req.function.n;
    if x.is_null() || n == 0 || req.lower.is_null() || req.upper.is_null() {
        return RawOutcome::new(status::INVALID_ARGS, 0, f64::NAN);
    }
    let polak_ribiere = match req.variant {
        variant::FLETCHER_REEVES => false,
        variant::POLAK_RIBIERE => true,
        _ => return RawOutcome::new(status::INVALID_ARGS, 0, f64::NAN),
    };
    if !(req.step_size > 0.0) || !(req.tol > 0.0 && req.tol < 1.0) {
        return RawOutcome::new(status::INVALID_ARGS, 0, f64::NAN);
    }

    let lower = slice::from_raw_parts(req.lower, n);
    let upper = slice::from_raw_parts(req.upper, n);
    let x = slice::from_raw_parts_mut(x, n);
    let oracle = Oracle {
        function: &req.function,
    };
    let project = |p: &mut [f64]| {
        for i in 0..n {
            p[i] = p[i].clamp(lower[i], upper[i]);
        }
    };

    project(&mut *x);
    let mut g = vec![0.0; n];
    let mut f = oracle.fdf(x, &mut g);
    if !f.is_finite() {
        return RawOutcome::new(status::FORCED_STOP, 0, f);
    }
    if projected_norm(x, &g, lower, upper) < req.grad_tol {
        return RawOutcome::new(status::GRADIENT_REACHED, 0, f);
    }

    let mut d: Vec<f64> = g.iter().map(|v| -v).collect();
    let mut step = req.step_size;
    let mut trial = vec![0.0; n];
    let mut g_new = vec![0.0; n];

    for iteration in 1..=req.max_iter {
        if dot(&g, &d) >= 0.0 {
            d.iter_mut().zip(&g).for_each(|(di, gi)| *di = -gi);
        }

        let mut alpha = step / norm(&d);
        let mut first_try = true;
        let accepted = loop {
            for i in 0..n {
                trial[i] = x[i] + alpha * d[i];
            }
            project(&mut trial);
            let ft = oracle.f(&mut trial);
            if ft.is_nan() {
                return RawOutcome::new(status::FORCED_STOP, iteration, f);
            }
            let decrease: f64 = (0..n).map(|i| g[i] * (trial[i] - x[i])).sum();
            if decrease < 0.0 && ft <= f + req.tol * decrease {
                break true;
            }
            alpha *= 0.5;
            first_try = false;
            if alpha < MIN_ALPHA {
                break false;
            }
        };
        if !accepted {
            return RawOutcome::new(status::ROUNDOFF, iteration, f);
        }

        step = if first_try { step * 2.0 } else { alpha * norm(&d) };
        x.copy_from_slice(&trial);
        let f_next = oracle.fdf(x, &mut g_new);
        if !f_next.is_finite() {
            return RawOutcome::new(status::FORCED_STOP, iteration, f);
        }
        f = f_next;

        if projected_norm(x, &g_new, lower, upper) < req.grad_tol {
            return RawOutcome::new(status::GRADIENT_REACHED, iteration, f);
        }

        let gg = dot(&g, &g);
        let beta = if iteration as usize % n == 0 || gg == 0.0 {
            0.0
        } else if polak_ribiere {
            let diff: Vec<f64> = g_new.iter().zip(&g).map(|(a, b)| a - b).collect();
            (dot(&g_new, &diff) / gg).max(0.0)
        } else {
            dot(&g_new, &g_new) / gg
        };
        for i in 0..n {
            d[i] = -g_new[i] + beta * d[i];
        }
        std::mem::swap(&mut g, &mut g_new);
    }
    RawOutcome::new(status::MAXITER_REACHED, req.max_iter, f)
}
