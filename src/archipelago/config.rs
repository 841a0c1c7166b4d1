//! Archipelago dispatch configuration.

/// How island evolutions are scheduled onto threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dispatch {
    /// One named OS thread per island, joined before the round returns.
    #[default]
    Threads,

    /// Islands share the global rayon pool.
    #[cfg(feature = "parallel")]
    Pool,
}
