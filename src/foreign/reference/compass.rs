//! Compass search behind the derivative-free ABI.

use crate::foreign::abi::{status, variant, LocalRequest, RawOutcome};
use std::ptr;
use std::slice;

/// Initial poll radius as a fraction of each bound width.
const INITIAL_RADIUS: f64 = 0.25;

#[derive(Clone, Copy)]
struct Score {
    violation: f64,
    value: f64,
}

impl Score {
    fn is_better_than(self, other: Score) -> bool {
        self.violation < other.violation
            || (self.violation == other.violation && self.value < other.value)
    }
}

/// Bound-constrained compass (coordinate pattern) search.
///
/// Polls `x ± r·width_i` along every coordinate, moving to the first point
/// that improves on the current one (lower total violation first, then lower
/// objective). When a full poll fails the radius `r` halves. Stops with
/// `XTOL_REACHED` once `r · max width` drops below `tol`, with
/// `MAXITER_REACHED` after `max_iter` polls, and with `FORCED_STOP` when a
/// callback returns NaN.
///
/// Each constraint callback is invoked exactly once per polled point.
///
/// # Safety
///
/// `request` must point to a valid [`LocalRequest`] whose bound arrays hold
/// `n` values and whose constraint array holds `constraint_count` entries;
/// `x` must be valid for `n` reads and writes.
#[no_mangle]
pub unsafe extern "C" fn u_globopt_compass_search(
    request: *const LocalRequest,
    x: *mut f64,
) -> RawOutcome {
    let Some(req) = request.as_ref() else {
        return RawOutcome::new(status::INVALID_ARGS, 0, f64::NAN);
    };
    if x.is_null() || req.n == 0 || req.lower.is_null() || req.upper.is_null() {
        return RawOutcome::new(status::INVALID_ARGS, 0, f64::NAN);
    }
    if req.variant != variant::COMPASS {
        return RawOutcome::new(status::INVALID_ARGS, 0, f64::NAN);
    }
    if req.constraint_count > 0 && req.constraints.is_null() {
        return RawOutcome::new(status::INVALID_ARGS, 0, f64::NAN);
    }

    let n = req.n as usize;
    let lower = slice::from_raw_parts(req.lower, n);
    let upper = slice::from_raw_parts(req.upper, n);
    let x = slice::from_raw_parts_mut(x, n);
    let constraints = if req.constraint_count == 0 {
        &[][..]
    } else {
        slice::from_raw_parts(req.constraints, req.constraint_count as usize)
    };

    let score = |p: &[f64]| -> Option<Score> {
        let value = (req.objective)(req.n, p.as_ptr(), ptr::null_mut(), req.objective_data);
        let mut violation = 0.0;
        for c in constraints {
            let g = (c.func)(req.n, p.as_ptr(), ptr::null_mut(), c.data);
            if g.is_nan() {
                return None;
            }
            violation += (g - c.tol).max(0.0);
        }
        (!value.is_nan()).then_some(Score { violation, value })
    };

    for i in 0..n {
        x[i] = x[i].clamp(lower[i], upper[i]);
    }
    let Some(mut current) = score(&*x) else {
        return RawOutcome::new(status::FORCED_STOP, 0, f64::NAN);
    };

    let max_width = (0..n).map(|i| upper[i] - lower[i]).fold(0.0, f64::max);
    let mut radius = INITIAL_RADIUS;
    let mut trial = x.to_vec();

    for iteration in 1..=req.max_iter {
        let mut moved = false;
        'poll: for i in 0..n {
            for sign in [1.0, -1.0] {
                let candidate = (x[i] + sign * radius * (upper[i] - lower[i])).clamp(lower[i], upper[i]);
                if candidate == x[i] {
                    continue;
                }
                trial.copy_from_slice(x);
                trial[i] = candidate;
                let Some(s) = score(&trial) else {
                    return RawOutcome::new(status::FORCED_STOP, iteration, current.value);
                };
                if s.is_better_than(current) {
                    x[i] = candidate;
                    current = s;
                    moved = true;
                    break 'poll;
                }
            }
        }
        if !moved {
            radius *= 0.5;
            if radius * max_width < req.tol {
                return RawOutcome::new(status::XTOL_REACHED, iteration, current.value);
            }
        }
    }
    RawOutcome::new(status::MAXITER_REACHED, req.max_iter, current.value)
}
