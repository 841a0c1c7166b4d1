//! Optimization problems.
//!
//! A [`Problem`] describes the decision space (dimension and box
//! [`Bounds`]), the number of objectives and constraints, and evaluates
//! decision vectors. Problems are immutable and shared read-only by every
//! population and worker thread that operates on them.
//!
//! Concrete problem catalogs live outside this crate; [`FnProblem`] wraps
//! closures for quick definitions.

mod closure;
mod types;

pub use closure::FnProblem;
pub use types::{Bounds, Evaluation, Problem};
