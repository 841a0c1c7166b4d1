//! Annealing run statistics.

/// Statistics of the most recent [`Annealing`](super::Annealing) walk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnealingStats {
    /// Problem evaluations performed by the walk.
    pub evaluations: usize,

    /// Accepted moves, improving or not.
    pub accepted_moves: usize,

    /// Temperature after the last outer iteration.
    pub final_temperature: f64,

    /// Per-component step sizes at the end of the walk.
    pub steps: Vec<f64>,

    /// Per-component acceptance ratios, one entry per adaptation window.
    pub acceptance_history: Vec<Vec<f64>>,

    /// Whether the walk's best point replaced a population member.
    pub improved: bool,
}

impl AnnealingStats {
    /// Overall fraction of accepted proposals.
    pub fn acceptance_ratio(&self) -> f64 {
        if self.evaluations == 0 {
            0.0
        } else {
            self.accepted_moves as f64 / self.evaluations as f64
        }
    }
}
