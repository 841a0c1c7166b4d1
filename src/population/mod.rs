//! Individuals and populations.
//!
//! - [`Individual`]: decision vector with cached fitness, constraints and
//!   violation. Evaluation happens on construction and on every change.
//! - [`Population`]: ordered individuals bound to one shared
//!   [`Problem`](crate::problem::Problem), with best/worst lookup under the
//!   violation-then-fitness order.

mod individual;
mod types;

pub use individual::Individual;
pub use types::Population;
