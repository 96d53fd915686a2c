use crate::errors::{SearchError, SearchResult};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Settings for a [`PuzzleSearch`](crate::puzzle::PuzzleSearch).
/// ```
/// use qpuzzle::puzzle::SearchConfig;
///
/// let config = SearchConfig::default().with_depth(3).with_seed(11);
/// assert_eq!(config.depth, 3);
/// assert_eq!(config.shots, 512);
/// assert_eq!(config.seed, Some(11));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Moves per sequence.
    pub depth: usize,
    /// Samples drawn from the final state.
    pub shots: usize,
    /// Seed for sampling, fresh entropy when `None`.
    pub seed: Option<u64>,
    /// Label of the blank tile.
    pub blank: usize,
    /// Largest circuit the search will simulate.
    pub max_qubits: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            shots: 512,
            seed: None,
            blank: 0,
            max_qubits: 24,
        }
    }
}

impl SearchConfig {
    /// Set the number of moves per sequence.
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Set the number of samples.
    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = shots;
        self
    }

    /// Make sampling reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the blank label.
    pub fn with_blank(mut self, blank: usize) -> Self {
        self.blank = blank;
        self
    }

    /// Set the largest circuit size.
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Check the settings which do not depend on the puzzle.
    pub fn validate(&self) -> SearchResult<()> {
        if self.shots == 0 {
            Err(SearchError::InvalidConfiguration(
                "at least one shot is required".to_string(),
            ))
        } else if self.max_qubits == 0 {
            Err(SearchError::InvalidConfiguration(
                "max_qubits must be positive".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    /// The sampling rng.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
