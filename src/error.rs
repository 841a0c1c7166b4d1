//! Error types shared by every algorithm and the archipelago driver.

use crate::foreign::SolverStatus;
use thiserror::Error;

/// Failure raised by a [`Problem`](crate::problem::Problem) while evaluating
/// a decision vector.
///
/// Propagated unchanged to the caller of `evolve`; never retried.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("evaluation failed: {message}")]
pub struct EvaluationError {
    /// Human-readable reason supplied by the problem.
    pub message: String,
}

impl EvaluationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors produced by populations, algorithms and the archipelago.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed or dimension-mismatched input, detected before any evaluation.
    #[error("invalid population: {0}")]
    InvalidPopulation(String),

    /// A foreign solver stopped without reporting success.
    #[error("solver diverged with status {status:?} after {iterations} iterations")]
    SolverDivergence {
        /// Status code reported by the solver.
        status: SolverStatus,
        /// Iterations the solver reported as performed.
        iterations: u32,
    },

    /// The problem's evaluation operation failed.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// One island of an archipelago failed to evolve.
    #[error("island {index} failed to evolve: {cause}")]
    EvolutionFailure {
        /// Index of the failed island.
        index: usize,
        /// The error returned by the island's algorithm.
        cause: Box<Error>,
    },

    /// A worker thread panicked while evolving.
    #[error("worker panicked: {0}")]
    WorkerPanic(String),

    /// A configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Index of the failed island, for [`Error::EvolutionFailure`].
    pub fn island_index(&self) -> Option<usize> {
        match self {
            Error::EvolutionFailure { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Returns `true` for [`Error::InvalidPopulation`].
    pub fn is_invalid_population(&self) -> bool {
        matches!(self, Error::InvalidPopulation(_))
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
