#![forbid(unsafe_code)]
#![deny(
    unreachable_pub,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces,
    missing_docs
)]

//! Grover-style amplitude amplification over production-rule sequences for sliding-tile
//! permutation puzzles, simulated on a local state vector.
//!
//! A puzzle configuration is a permutation of `n` tile labels, one of which is the blank. Each
//! move rule swaps two board positions and is only legal when the blank sits on one of them.
//! The search superposes every move sequence of a fixed depth, marks the sequences which carry the
//! start configuration to the goal, amplifies them, and samples the result.
//!
//! # Example (3-puzzle)
//! ```
//! use qpuzzle::prelude::*;
//!
//! # fn main() -> SearchResult<()> {
//! let start = Permutation::new(vec![1, 2, 3, 0])?;
//! let goal = Permutation::new(vec![0, 2, 1, 3])?;
//!
//! let config = SearchConfig::default().with_depth(2).with_seed(7);
//! let mut search = PuzzleSearch::new(RuleSet::two_by_two(), config)?;
//! let report = search.run(&start, &goal)?;
//!
//! // Only one length-2 sequence reaches the goal, amplification makes it dominant.
//! assert_eq!(report.marked_sequences, 1);
//! let best = &report.outcomes[0];
//! assert_eq!(best.permutation, goal);
//! assert_eq!(best.sequence.steps(), &[3, 1]);
//! # Ok(())
//! # }
//! ```
//!
//! # Building circuits directly
//! The simulator underneath is usable on its own. Registers are moved through the builder, and
//! conditioned builders wrap every unitary they receive in a control.
//! ```
//! use qpuzzle::prelude::*;
//!
//! # fn main() -> CircuitResult<()> {
//! let mut b = LocalBuilder::<f64>::default();
//! let c = b.qudit(2).unwrap();
//! let t = b.qubit();
//!
//! // Flip `t` when `c` holds 0b01, that is the first qubit set and the second clear.
//! let mut cb = b.condition_with_state(c, 0b01)?;
//! let t = cb.x(t)?;
//! let c = cb.dissolve();
//!
//! let (_, t_handle) = b.measure(t);
//! let (_, measured) = b.calculate_state_with_init([(&c, 0b01)])?;
//! assert_eq!(measured.get_measurement(t_handle), Some((1, 1.0)));
//! # Ok(())
//! # }
//! ```

/// A circuit builder implementation which builds circuits out of simple elements.
pub mod builder;
/// Standard traits for circuit builders.
pub mod builder_traits;
/// Traits for constructing conditioned circuit builders.
pub mod conditioning;
/// Circuit builder and search error types.
pub mod errors;
/// Sliding-tile puzzles as an amplitude amplification search.
pub mod puzzle;
/// Macros switching between sequential and rayon iteration.
pub mod rayon_helper;
/// Lower-level circuit operations.
pub mod state_ops;
/// Reusable types.
pub mod types;
/// Utility functions for bit and index manipulation
pub mod utils;

pub use num_complex::Complex;
pub use rand;
pub use types::*;

/// Commonly used types and traits.
/// ```
/// use qpuzzle::prelude::*;
/// ```
pub mod prelude {
    pub use super::*;
    pub use crate::builder::LocalBuilder;
    pub use crate::builder_traits::*;
    pub use crate::conditioning::*;
    pub use crate::errors::*;
    pub use crate::puzzle::{
        MoveRule, MoveSequence, Permutation, PuzzleSearch, RuleSet, SampleOutcome,
        SearchConfig, SearchLayout, SearchReport,
    };
}
