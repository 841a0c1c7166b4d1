//! Adaptive Simulated Annealing (ASA).
//!
//! A single-trajectory search with per-component step sizes that adapt to
//! their acceptance ratio, nested inside a geometric cooling schedule.
//! Worsening moves are accepted with probability `exp(-delta / T)`.
//!
//! Run it on a background copy of a population with
//! [`spawn_evolution`](crate::algorithm::spawn_evolution).
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Corana, Marchesi, Martini & Ridella (1987), ACM TOMS 13(3)

mod config;
mod runner;
mod types;

pub use config::AnnealingConfig;
pub use runner::Annealing;
pub use types::AnnealingStats;
