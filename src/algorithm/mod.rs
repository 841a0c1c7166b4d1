//! The algorithm abstraction.
//!
//! Every strategy (simulated annealing, Monte Carlo sampling, foreign solver
//! wrappers) implements [`Algorithm::evolve`], consuming and producing a
//! [`Population`](crate::population::Population) in place.
//!
//! [`spawn_evolution`] runs an independent copy of an algorithm on an
//! independent copy of a population in a background thread.

mod spawn;
mod types;

pub(crate) use spawn::panic_message;
pub use spawn::{spawn_evolution, EvolutionHandle};
pub use types::{check_population, Algorithm};
