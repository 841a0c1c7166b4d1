//! The problem contract and box bounds.

use crate::error::{Error, EvaluationError, Result};
use rand::Rng;

/// Box bounds of a decision space.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    /// Creates bounds, checking lengths, finiteness and `lower <= upper`.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(Error::InvalidConfig(format!(
                "bounds mismatch: lower has {} elements, upper has {}",
                lower.len(),
                upper.len()
            )));
        }
        if lower.is_empty() {
            return Err(Error::InvalidConfig("bounds must not be empty".into()));
        }
        for (i, (&lo, &hi)) in lower.iter().zip(&upper).enumerate() {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(Error::InvalidConfig(format!(
                    "invalid bounds at index {i}: lower ({lo}) > upper ({hi}) or not finite"
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// The same `[low, high]` interval in every one of `dimension` components.
    pub fn uniform(dimension: usize, low: f64, high: f64) -> Result<Self> {
        Self::new(vec![low; dimension], vec![high; dimension])
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// `upper[i] - lower[i]`.
    pub fn width(&self, i: usize) -> f64 {
        self.upper[i] - self.lower[i]
    }

    /// Whether `x` has the right length and every component lies in bounds.
    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.dimension()
            && x
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }

    /// Projects `x` onto the box in place.
    pub fn clamp(&self, x: &mut [f64]) {
        for (v, (&lo, &hi)) in x.iter_mut().zip(self.lower.iter().zip(&self.upper)) {
            *v = v.clamp(lo, hi);
        }
    }

    /// Uniform sample inside the box.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(&lo, &hi)| crate::random::uniform(rng, lo, hi))
            .collect()
    }
}

/// Result of evaluating one decision vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Objective values, one per objective.
    pub fitness: Vec<f64>,
    /// Equality components first, then inequality components.
    pub constraints: Vec<f64>,
}

/// An optimization task.
///
/// Implementations describe the decision space and compute objective and
/// constraint values. Algorithms minimize every objective.
///
/// # Constraints
///
/// The constraint vector holds the equality components first (satisfied when
/// `c_i(x) = 0`) followed by the inequality components (satisfied when
/// `c_i(x) <= 0`), each within [`constraint_tolerance`](Problem::constraint_tolerance).
///
/// # Purity
///
/// `objective` and `constraints` must be functions of `x` alone. A problem is
/// shared read-only between worker threads; any internal cache has to carry
/// its own synchronization.
///
/// # Examples
///
/// ```
/// use u_globopt::problem::{Bounds, Problem};
/// use u_globopt::EvaluationError;
///
/// struct Sphere { bounds: Bounds }
///
/// impl Problem for Sphere {
///     fn bounds(&self) -> &Bounds { &self.bounds }
///
///     fn objective(&self, x: &[f64], f: &mut [f64]) -> Result<(), EvaluationError> {
///         f[0] = x.iter().map(|v| v * v).sum();
///         Ok(())
///     }
/// }
/// ```
pub trait Problem: Send + Sync {
    /// Box bounds of the decision space.
    fn bounds(&self) -> &Bounds;

    /// Writes the objective values of `x` into `f` (length [`objective_count`](Problem::objective_count)).
    fn objective(&self, x: &[f64], f: &mut [f64]) -> std::result::Result<(), EvaluationError>;

    /// Writes the constraint values of `x` into `c` (length [`constraint_count`](Problem::constraint_count)).
    fn constraints(&self, _x: &[f64], _c: &mut [f64]) -> std::result::Result<(), EvaluationError> {
        Ok(())
    }

    /// Length of the decision vector.
    fn dimension(&self) -> usize {
        self.bounds().dimension()
    }

    fn objective_count(&self) -> usize {
        1
    }

    fn equality_constraints(&self) -> usize {
        0
    }

    fn inequality_constraints(&self) -> usize {
        0
    }

    /// Slack under which a constraint component counts as satisfied.
    fn constraint_tolerance(&self) -> f64 {
        0.0
    }

    fn constraint_count(&self) -> usize {
        self.equality_constraints() + self.inequality_constraints()
    }

    fn is_constrained(&self) -> bool {
        self.constraint_count() > 0
    }

    /// Evaluates fitness and constraints of `x`.
    fn evaluate(&self, x: &[f64]) -> Result<Evaluation> {
        let mut fitness = vec![0.0; self.objective_count()];
        self.objective(x, &mut fitness)?;
        let mut constraints = vec![0.0; self.constraint_count()];
        if !constraints.is_empty() {
            self.constraints(x, &mut constraints)?;
        }
        Ok(Evaluation {
            fitness,
            constraints,
        })
    }

    /// Total violation of a constraint vector; zero when feasible.
    fn violation(&self, c: &[f64]) -> f64 {
        let tol = self.constraint_tolerance();
        let (eq, ineq) = c.split_at(self.equality_constraints().min(c.len()));
        let eq_part: f64 = eq.iter().map(|v| (v.abs() - tol).max(0.0)).sum();
        let ineq_part: f64 = ineq.iter().map(|v| (v - tol).max(0.0)).sum();
        eq_part + ineq_part
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    struct Constrained {
        bounds: Bounds,
    }

    impl Problem for Constrained {
        fn bounds(&self) -> &Bounds {
            &self.bounds
        }

        fn objective(&self, x: &[f64], f: &mut [f64]) -> std::result::Result<(), EvaluationError> {
            f[0] = x[0] + x[1];
            Ok(())
        }

        fn constraints(&self, x: &[f64], c: &mut [f64]) -> std::result::Result<(), EvaluationError> {
            c[0] = x[0] - x[1];
            c[1] = x[0] * x[0] - 1.0;
            Ok(())
        }

        fn equality_constraints(&self) -> usize {
            1
        }

        fn inequality_constraints(&self) -> usize {
            1
        }
    }

    #[test]
    fn test_bounds_validation() {
        assert!(Bounds::new(vec![0.0], vec![1.0, 2.0]).is_err());
        assert!(Bounds::new(vec![2.0], vec![1.0]).is_err());
        assert!(Bounds::new(vec![f64::NAN], vec![1.0]).is_err());
        assert!(Bounds::new(vec![], vec![]).is_err());
        assert!(Bounds::new(vec![1.0], vec![1.0]).is_ok());
    }

    #[test]
    fn test_bounds_clamp_and_contains() {
        let b = Bounds::uniform(3, -1.0, 1.0).unwrap();
        let mut x = vec![-3.0, 0.5, 9.0];
        assert!(!b.contains(&x));
        b.clamp(&mut x);
        assert_eq!(x, vec![-1.0, 0.5, 1.0]);
        assert!(b.contains(&x));
        assert!(!b.contains(&[0.0, 0.0]));
    }

    #[test]
    fn test_bounds_sample_inside() {
        let b = Bounds::new(vec![-5.0, 0.0, 2.0], vec![5.0, 1e-3, 2.0]).unwrap();
        let mut rng = create_rng(Some(3));
        for _ in 0..100 {
            assert!(b.contains(&b.sample(&mut rng)));
        }
    }

    #[test]
    fn test_evaluate_layout_and_violation() {
        let p = Constrained {
            bounds: Bounds::uniform(2, -2.0, 2.0).unwrap(),
        };
        let e = p.evaluate(&[1.5, 0.5]).unwrap();
        assert_eq!(e.fitness, vec![2.0]);
        assert_eq!(e.constraints, vec![1.0, 1.25]);
        assert!((p.violation(&e.constraints) - 2.25).abs() < 1e-12);
        assert_eq!(p.violation(&[0.0, -4.0]), 0.0);
        assert!((p.violation(&[-0.5, -4.0]) - 0.5).abs() < 1e-12);
    }
}
