//! Concurrent evolution of independent islands.
//!
//! An [`Archipelago`] owns a set of [`Island`]s, each pairing an
//! [`Algorithm`](crate::algorithm::Algorithm) with its
//! [`Population`](crate::population::Population). One call to
//! [`Archipelago::evolve`] runs every island's algorithm on a private copy
//! of its population in parallel, then writes the copies back by index.
//! A failing island is reported without disturbing the others.

mod config;
mod runner;
mod types;

pub use config::Dispatch;
pub use runner::Archipelago;
pub use types::{EvolutionFailures, Island};
