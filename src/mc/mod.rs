//! Monte Carlo random search.
//!
//! The simplest stochastic strategy: uniform sampling with worst-member
//! replacement. Useful as a baseline and as a cheap island algorithm.

mod config;
mod runner;

pub use config::MonteCarloConfig;
pub use runner::MonteCarlo;
