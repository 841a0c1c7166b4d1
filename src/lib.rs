//! Box-constrained global optimization over user-supplied objectives.
//!
//! Provides a family of search strategies behind one
//! [`Algorithm`](algorithm::Algorithm) contract, all evolving a
//! [`Population`](population::Population) of candidate solutions to a
//! [`Problem`](problem::Problem):
//!
//! - **Simulated Annealing (SA)**: Corana-style adaptive annealing with
//!   per-component step sizes and a geometric cooling schedule.
//! - **Monte Carlo (MC)**: Uniform random sampling inside the bounds.
//! - **Foreign solvers**: Local solvers reached through a C ABI, either
//!   derivative-free with constraints or gradient-based. Two reference
//!   solvers are exported over the same ABI.
//! - **Archipelago**: Concurrent evolution of independent
//!   (algorithm, population) islands with deterministic write-back.
//!
//! # Architecture
//!
//! Problems are immutable and shared as `Arc<dyn Problem>`. Populations are
//! cheap to clone and every algorithm owns its random generator, so a round
//! of concurrent evolution never shares mutable state between workers.
//!
//! # Features
//!
//! - `parallel`: rayon-backed population sampling and a pooled archipelago
//!   dispatch mode.
//! - `serde`: `Serialize`/`Deserialize` for configuration types.

pub mod algorithm;
pub mod archipelago;
pub mod error;
pub mod foreign;
pub mod mc;
pub mod population;
pub mod problem;
pub mod random;
pub mod sa;

pub use error::{Error, EvaluationError, Result};
