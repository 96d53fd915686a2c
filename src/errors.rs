use thiserror::Error;

/// An error from building or simulating the circuit.
#[derive(Debug, Error)]
pub enum CircuitError {
    /// A generic error.
    #[error("{0}")]
    Generic(String),
}

impl CircuitError {
    /// Construct a new error.
    pub fn new<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Generic(msg.into())
    }
}

/// A result which may contain a circuit error.
pub type CircuitResult<T> = Result<T, CircuitError>;

/// An error from setting up or running a puzzle search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The supplied tiles do not form a permutation of the expected labels.
    #[error("invalid permutation {tiles:?}: {reason}")]
    InvalidPermutation {
        /// Tiles as supplied by the caller.
        tiles: Vec<usize>,
        /// What is wrong with them.
        reason: String,
    },
    /// A state index fell outside `[0, n!)`.
    #[error("index {index} is out of range for {n} tiles (must be below {bound})")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// Number of tiles.
        n: usize,
        /// `n!`, the exclusive upper bound.
        bound: usize,
    },
    /// No move sequence of the requested depth reaches the goal.
    #[error("no sequence of {depth} moves reaches the goal")]
    UnsatisfiableDepth {
        /// The search depth.
        depth: usize,
    },
    /// A synthesized rule operator is not a permutation.
    #[error("operator synthesis failed for rule ({a}, {b}): {reason}")]
    OperatorSynthesis {
        /// First position swapped by the rule.
        a: usize,
        /// Second position swapped by the rule.
        b: usize,
        /// The violated property.
        reason: String,
    },
    /// The rules or configuration do not fit the puzzle.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The search needs more qubits than allowed.
    #[error("search needs {required} qubits but at most {allowed} are allowed")]
    CircuitTooLarge {
        /// Qubits the layout requires.
        required: usize,
        /// Configured maximum.
        allowed: usize,
    },
    /// The simulator rejected the circuit.
    #[error(transparent)]
    Circuit(#[from] CircuitError),
}

/// A result which may contain a search error.
pub type SearchResult<T> = Result<T, SearchError>;

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_circuit_error_converts() {
        let err: SearchError = CircuitError::new("bad matrix").into();
        assert_eq!(err.to_string(), "bad matrix");
    }

    #[test]
    fn test_out_of_range_message() {
        let err = SearchError::OutOfRange {
            index: 24,
            n: 4,
            bound: 24,
        };
        assert_eq!(
            err.to_string(),
            "index 24 is out of range for 4 tiles (must be below 24)"
        );
    }
}
