//! Monte Carlo configuration.

/// Configuration for [`MonteCarlo`](super::MonteCarlo) sampling.
///
/// # Examples
///
/// ```
/// use u_globopt::mc::MonteCarloConfig;
///
/// let config = MonteCarloConfig::default().with_samples(500).with_seed(3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonteCarloConfig {
    /// Uniform samples drawn per evolve call.
    pub samples: usize,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            seed: None,
        }
    }
}

impl MonteCarloConfig {
    pub fn with_samples(mut self, n: usize) -> Self {
        self.samples = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.samples == 0 {
            return Err("samples must be at least 1".into());
        }
        Ok(())
    }
}
