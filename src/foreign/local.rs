//! Derivative-free foreign solver wrapper.

use super::abi::{LocalEntry, LocalRequest, RawConstraint};
use super::config::LocalConfig;
use super::context::{context_ptr, CallbackContext, ConstraintSlot, OBJECTIVE_SHIM};
use super::outcome::settle;
use super::reference::u_globopt_compass_search;
use crate::algorithm::{check_population, Algorithm};
use crate::error::{Error, Result};
use crate::population::Population;
use std::cell::RefCell;
use std::ffi::c_uint;
use std::ptr;
use std::sync::Arc;
use tracing::debug;

/// Finite-difference step used when a solver asks for gradients.
const NUMDIFF_STEP: f64 = 1e-8;

/// Runs one local solve from the best member of the population through a
/// derivative-free entry point.
///
/// Equality constraints are forwarded as `|c(x)| <= tol` and inequalities
/// as `c(x) <= tol`, with `tol` the problem's constraint tolerance.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_globopt::algorithm::Algorithm;
/// use u_globopt::foreign::{LocalConfig, LocalWrapper};
/// use u_globopt::population::Population;
/// use u_globopt::problem::{Bounds, FnProblem};
///
/// let problem = Arc::new(FnProblem::new(Bounds::uniform(2, -5.0, 5.0).unwrap(), |x| {
///     Ok((x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2))
/// }));
/// let mut pop = Population::new(problem);
/// pop.push(vec![4.0, 4.0]).unwrap();
///
/// let mut local = LocalWrapper::new(LocalConfig::default()).unwrap();
/// local.evolve(&mut pop).unwrap();
/// assert!(pop.best().unwrap().fitness()[0] < 1e-8);
/// ```
#[derive(Debug, Clone)]
pub struct LocalWrapper {
    config: LocalConfig,
    entry: LocalEntry,
}

impl LocalWrapper {
    /// Wrapper around the bundled compass search.
    pub fn new(config: LocalConfig) -> Result<Self> {
        // SAFETY: the reference solver honors the request contract.
        unsafe { Self::with_entry(config, u_globopt_compass_search) }
    }

    /// Wrapper around an external entry point.
    ///
    /// # Safety
    ///
    /// `entry` must read the request only during the call, keep `x` within
    /// `n` elements and invoke the callbacks only with valid `n`-element
    /// vectors from the calling thread.
    pub unsafe fn with_entry(config: LocalConfig, entry: LocalEntry) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        Ok(Self { config, entry })
    }

    pub fn config(&self) -> &LocalConfig {
        &self.config
    }
}

impl Algorithm for LocalWrapper {
    fn evolve(&mut self, population: &mut Population) -> Result<()> {
        check_population(population, None)?;
        let problem = Arc::clone(population.problem());
        if problem.objective_count() != 1 {
            return Err(Error::InvalidPopulation(format!(
                "local solvers need a single objective, problem has {}",
                problem.objective_count()
            )));
        }
        if problem.is_constrained() && !self.config.constrained {
            return Err(Error::InvalidPopulation(
                "problem is constrained but the wrapper is configured unconstrained".into(),
            ));
        }
        let start = population
            .best()
            .cloned()
            .ok_or_else(|| Error::InvalidPopulation("population is empty".into()))?;

        let bounds = problem.bounds();
        let mut x = start.x().to_vec();
        let context = RefCell::new(CallbackContext::new(problem.as_ref(), NUMDIFF_STEP));
        let outcome = {
            let slots = ConstraintSlot::for_all(&context, problem.constraint_count());
            let raw: Vec<RawConstraint> = slots
                .iter()
                .map(|slot| slot.raw(problem.constraint_tolerance()))
                .collect();
            let request = LocalRequest {
                n: problem.dimension() as c_uint,
                lower: bounds.lower().as_ptr(),
                upper: bounds.upper().as_ptr(),
                objective: OBJECTIVE_SHIM,
                objective_data: context_ptr(&context),
                constraints: if raw.is_empty() { ptr::null() } else { raw.as_ptr() },
                constraint_count: raw.len() as c_uint,
                max_iter: self.config.max_iterations,
                tol: self.config.tolerance,
                variant: self.config.variant.raw(),
            };
            // SAFETY: request, slots and context outlive the call; x holds n values.
            unsafe { (self.entry)(&request, x.as_mut_ptr()) }
        };

        let context = context.into_inner();
        debug!(
            objective_calls = context.objective_calls,
            constraint_evaluations = context.constraint_evaluations,
            "local callbacks"
        );
        if let Some(err) = context.error {
            return Err(err);
        }
        settle(population, &start, x, outcome, self.name())
    }

    fn name(&self) -> &str {
        "local"
    }

    fn describe(&self) -> String {
        format!(
            "local(variant={:?}, max_iterations={}, tolerance={:e}, constrained={})",
            self.config.variant, self.config.max_iterations, self.config.tolerance, self.config.constrained
        )
    }

    fn clone_box(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;
    use crate::foreign::abi::{status, RawFunc, RawOutcome, SolverStatus};
    use crate::foreign::config::LocalVariant;
    use crate::problem::{Bounds, FnProblem, Problem};
    use crate::random::create_rng;
    use std::cell::Cell;
    use std::ffi::c_void;
    use std::slice;

    thread_local! {
        static CONSTRAINT_CALLS: Cell<usize> = const { Cell::new(0) };
        static SEEN: RefCell<Vec<(Vec<f64>, f64, f64, usize)>> = const { RefCell::new(Vec::new()) };
        static CALLBACK_LOG: RefCell<Vec<(Option<usize>, Vec<f64>)>> = const { RefCell::new(Vec::new()) };
    }

    /// One equality `x0 - 0.5 = 0`, one inequality `x1 - 0.25 <= 0`.
    fn counted_problem() -> Arc<dyn Problem> {
        Arc::new(
            FnProblem::new(Bounds::uniform(2, -1.0, 1.0).unwrap(), |x| Ok(x[0] + x[1]))
                .with_equalities(1, |x, c| {
                    c[0] = x[0] - 0.5;
                    Ok(())
                })
                .with_inequalities(1, |x, c| {
                    CONSTRAINT_CALLS.with(|n| n.set(n.get() + 1));
                    c[0] = x[1] - 0.25;
                    Ok(())
                }),
        )
    }

    /// Queries both constraints (the first twice) at the start point and at
    /// the origin, then reports the origin.
    unsafe extern "C" fn probing_solver(request: *const LocalRequest, x: *mut f64) -> RawOutcome {
        let req = &*request;
        let n = req.n as usize;
        let constraints = slice::from_raw_parts(req.constraints, req.constraint_count as usize);
        let x = slice::from_raw_parts_mut(x, n);
        let points = [x.to_vec(), vec![0.0; n]];
        for p in &points {
            let before = CONSTRAINT_CALLS.with(Cell::get);
            let c0 = (constraints[0].func)(req.n, p.as_ptr(), ptr::null_mut(), constraints[0].data);
            let c1 = (constraints[1].func)(req.n, p.as_ptr(), ptr::null_mut(), constraints[1].data);
            (constraints[0].func)(req.n, p.as_ptr(), ptr::null_mut(), constraints[0].data);
            let calls = CONSTRAINT_CALLS.with(Cell::get) - before;
            SEEN.with(|s| s.borrow_mut().push((p.clone(), c0, c1, calls)));
        }
        x.fill(0.0);
        RawOutcome::new(status::SUCCESS, 1, 0.0)
    }

    /// Moves to the origin but reports running out of iterations.
    unsafe extern "C" fn exhausted_solver(request: *const LocalRequest, x: *mut f64) -> RawOutcome {
        let n = (*request).n as usize;
        slice::from_raw_parts_mut(x, n).fill(0.0);
        RawOutcome::new(status::MAXITER_REACHED, (*request).max_iter, 0.0)
    }

    /// Calls the objective at the upper bound corner and returns success.
    unsafe extern "C" fn corner_solver(request: *const LocalRequest, x: *mut f64) -> RawOutcome {
        let req = &*request;
        let corner = slice::from_raw_parts(req.upper, req.n as usize).to_vec();
        let value = (req.objective)(req.n, corner.as_ptr(), ptr::null_mut(), req.objective_data);
        slice::from_raw_parts_mut(x, req.n as usize).copy_from_slice(&corner);
        RawOutcome::new(status::SUCCESS, 1, value)
    }

    /// A callback plus the constraint index it answers for (`None` for the
    /// objective).
    struct Logged {
        func: RawFunc,
        data: *mut c_void,
        index: Option<usize>,
    }

    unsafe extern "C" fn logged(n: c_uint, x: *const f64, grad: *mut f64, data: *mut c_void) -> f64 {
        let inner = &*(data as *const Logged);
        let point = slice::from_raw_parts(x, n as usize).to_vec();
        CALLBACK_LOG.with(|log| log.borrow_mut().push((inner.index, point)));
        (inner.func)(n, x, grad, inner.data)
    }

    /// The bundled compass search with every callback routed through `logged`.
    unsafe extern "C" fn logged_compass(request: *const LocalRequest, x: *mut f64) -> RawOutcome {
        let req = &*request;
        let objective = Logged {
            func: req.objective,
            data: req.objective_data,
            index: None,
        };
        let originals = slice::from_raw_parts(req.constraints, req.constraint_count as usize);
        let wrapped: Vec<Logged> = originals
            .iter()
            .enumerate()
            .map(|(i, c)| Logged {
                func: c.func,
                data: c.data,
                index: Some(i),
            })
            .collect();
        let constraints: Vec<RawConstraint> = originals
            .iter()
            .zip(&wrapped)
            .map(|(c, w)| RawConstraint {
                func: logged,
                data: w as *const Logged as *mut c_void,
                tol: c.tol,
            })
            .collect();
        let inner = LocalRequest {
            objective: logged,
            objective_data: &objective as *const Logged as *mut c_void,
            constraints: constraints.as_ptr(),
            ..*req
        };
        u_globopt_compass_search(&inner, x)
    }

    fn sphere(dim: usize) -> Arc<dyn Problem> {
        Arc::new(FnProblem::new(Bounds::uniform(dim, -5.0, 5.0).unwrap(), |x| {
            Ok(x.iter().map(|v| (v - 1.0) * (v - 1.0)).sum())
        }))
    }

    #[test]
    fn test_constraint_marshaling() {
        SEEN.with(|s| s.borrow_mut().clear());
        let problem = counted_problem();
        let mut pop = Population::new(Arc::clone(&problem));
        pop.push(vec![0.9, 0.75]).unwrap();

        let config = LocalConfig::default().with_constrained(true);
        let mut wrapper = unsafe { LocalWrapper::with_entry(config, probing_solver) }.unwrap();
        wrapper.evolve(&mut pop).unwrap();

        let seen = SEEN.with(|s| s.borrow().clone());
        assert_eq!(seen.len(), 2);
        for (x, c0, c1, calls) in seen {
            let expected = problem.evaluate(&x).unwrap().constraints;
            assert_eq!(calls, 1, "one constraint evaluation per point");
            assert!((c0 - expected[0].abs()).abs() < 1e-15);
            assert!((c1 - expected[1]).abs() < 1e-15);
        }
    }

    #[test]
    fn test_compass_queries_each_inequality_once_per_point() {
        CALLBACK_LOG.with(|log| log.borrow_mut().clear());
        let problem: Arc<dyn Problem> = Arc::new(
            FnProblem::new(Bounds::uniform(2, -1.0, 1.0).unwrap(), |x| {
                Ok((x[0] - 1.0).powi(2) + (x[1] - 1.0).powi(2))
            })
            .with_inequalities(2, |x, c| {
                CONSTRAINT_CALLS.with(|n| n.set(n.get() + 1));
                c[0] = x[0] - 0.5;
                c[1] = x[1] - 0.2;
                Ok(())
            }),
        );
        let mut pop = Population::new(problem);
        pop.push(vec![-0.5, -0.5]).unwrap();
        let before = CONSTRAINT_CALLS.with(Cell::get);

        let config = LocalConfig::default().with_constrained(true);
        let mut wrapper = unsafe { LocalWrapper::with_entry(config, logged_compass) }.unwrap();
        wrapper.evolve(&mut pop).unwrap();

        let log = CALLBACK_LOG.with(|log| log.borrow().clone());
        assert!(!log.is_empty());
        assert_eq!(log.len() % 3, 0);
        for poll in log.chunks(3) {
            let indices: Vec<Option<usize>> = poll.iter().map(|(index, _)| *index).collect();
            assert_eq!(indices, vec![None, Some(0), Some(1)]);
            assert!(poll.iter().all(|(_, x)| x == &poll[0].1));
        }
        // One problem evaluation per polled point, plus the final write-back.
        let polls = log.len() / 3;
        assert_eq!(CONSTRAINT_CALLS.with(Cell::get) - before, polls + 1);

        let best = pop.best().unwrap();
        assert!(best.is_feasible());
        assert!((best.x()[0] - 0.5).abs() < 1e-5, "{:?}", best.x());
        assert!((best.x()[1] - 0.2).abs() < 1e-5, "{:?}", best.x());
    }

    #[test]
    fn test_rejects_constrained_problem_when_unconstrained() {
        let mut pop = Population::new(counted_problem());
        pop.push(vec![0.0, 0.0]).unwrap();
        let mut wrapper = LocalWrapper::new(LocalConfig::default()).unwrap();
        assert!(wrapper.evolve(&mut pop).unwrap_err().is_invalid_population());
    }

    #[test]
    fn test_compass_improves_best() {
        let mut pop = Population::random(sphere(3), 5, &mut create_rng(Some(2))).unwrap();
        let before = pop.best().unwrap().fitness()[0];
        let mut wrapper = LocalWrapper::new(LocalConfig::default().with_tolerance(1e-9)).unwrap();
        wrapper.evolve(&mut pop).unwrap();
        assert_eq!(pop.len(), 5);
        let after = pop.best().unwrap().fitness()[0];
        assert!(after < before);
        assert!(after < 1e-10);
    }

    #[test]
    fn test_divergence_writes_strict_improvement() {
        let mut pop = Population::new(sphere(2));
        pop.push(vec![3.0, 3.0]).unwrap();
        pop.push(vec![-4.0, -4.0]).unwrap();
        let mut wrapper = unsafe { LocalWrapper::with_entry(LocalConfig::default(), exhausted_solver) }.unwrap();
        let err = wrapper.evolve(&mut pop).unwrap_err();
        assert!(matches!(
            err,
            Error::SolverDivergence { status: SolverStatus::MaxIterReached, iterations: 1000 }
        ));
        let mut fitness: Vec<f64> = pop.iter().map(|i| i.fitness()[0]).collect();
        fitness.sort_by(f64::total_cmp);
        assert_eq!(fitness, vec![2.0, 8.0]);
    }

    #[test]
    fn test_evaluation_error_surfaces_without_write() {
        let problem: Arc<dyn Problem> = Arc::new(FnProblem::new(Bounds::uniform(1, 0.0, 1.0).unwrap(), |x| {
            if x[0] > 0.9 {
                Err(EvaluationError::new("outside model range"))
            } else {
                Ok(x[0])
            }
        }));
        let mut pop = Population::new(problem);
        pop.push(vec![0.5]).unwrap();
        let mut wrapper = unsafe { LocalWrapper::with_entry(LocalConfig::default(), corner_solver) }.unwrap();
        let err = wrapper.evolve(&mut pop).unwrap_err();
        assert!(matches!(err, Error::Evaluation(_)));
        assert_eq!(pop.get(0).unwrap().x(), &[0.5]);
    }

    #[test]
    fn test_unknown_variant_diverges() {
        let mut pop = Population::new(sphere(1));
        pop.push(vec![0.0]).unwrap();
        let config = LocalConfig::default().with_variant(LocalVariant::Custom(42));
        let mut wrapper = LocalWrapper::new(config).unwrap();
        let err = wrapper.evolve(&mut pop).unwrap_err();
        assert!(matches!(
            err,
            Error::SolverDivergence { status: SolverStatus::InvalidArgs, .. }
        ));
        assert_eq!(pop.get(0).unwrap().x(), &[0.0]);
    }

    #[test]
    fn test_empty_population() {
        let mut pop = Population::new(sphere(2));
        let mut wrapper = LocalWrapper::new(LocalConfig::default()).unwrap();
        assert!(wrapper.evolve(&mut pop).unwrap_err().is_invalid_population());
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(matches!(
            LocalWrapper::new(LocalConfig::default().with_tolerance(-1.0)),
            Err(Error::InvalidConfig(_))
        ));
    }
}
