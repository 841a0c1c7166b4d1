//! Foreign local solvers behind a C ABI.
//!
//! [`LocalWrapper`] and [`GradientWrapper`] adapt a solver entry point to
//! the [`Algorithm`](crate::algorithm::Algorithm) contract: they start from
//! the best member of the population, run the solver once, and fold its
//! result back in. Problem evaluations reach the solver through `extern "C"`
//! shims that recover a stack-scoped callback context from the solver's
//! opaque data pointer.
//!
//! The crate exports two reference entry points over the same ABI,
//! [`u_globopt_compass_search`] and [`u_globopt_conjugate_gradient`], used
//! by default when no native library is supplied.

pub mod abi;
mod config;
mod context;
mod gradient;
mod local;
mod outcome;
mod reference;

pub use abi::SolverStatus;
pub use config::{GradientConfig, GradientVariant, LocalConfig, LocalVariant};
pub use gradient::GradientWrapper;
pub use local::LocalWrapper;
pub use reference::{u_globopt_compass_search, u_globopt_conjugate_gradient};
