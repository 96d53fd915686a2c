//! Sliding-tile puzzles encoded as an amplitude amplification search over move sequences.
//!
//! The circuit holds a state register, wide enough to index every permutation of the tiles, and
//! one selector block per step of the search depth. Each rule operator is a basis permutation of
//! the state register, applied under the condition that the step's selector block selects it.

/// Reversible circuit pieces of the search: preparation, moves, oracle and diffusion.
pub mod circuit;
/// Classical reference solvers used to check and report on a search.
pub mod classical;
/// Permutation codec between tile arrangements and dense indices.
pub mod codec;
/// Search configuration.
pub mod config;
/// Turning sampled register values into ranked outcomes.
pub mod decoder;
/// Qubit layout of the search circuit.
pub mod layout;
/// Quantum random numbers and random solvable starting arrangements.
pub mod random;
/// Move rules and the basis permutations they induce.
pub mod rules;
/// Iteration count and the amplification loop.
pub mod amplification;
/// The search front end.
pub mod search;

pub use codec::Permutation;
pub use config::SearchConfig;
pub use decoder::{MoveSequence, SampleOutcome};
pub use layout::SearchLayout;
pub use rules::{MoveRule, RuleOperator, RuleSet};
pub use search::{PuzzleSearch, SearchReport};
