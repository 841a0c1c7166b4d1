//! Reference solvers exported over the C ABI.
//!
//! They let the wrappers run without a native optimization library and
//! double as executable documentation of the calling conventions. Any
//! library entry point with the same signature can replace them.

mod cg;
mod compass;

pub use cg::u_globopt_conjugate_gradient;
pub use compass::u_globopt_compass_search;
