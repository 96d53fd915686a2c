/// Contains functions, structs, and enums for storing and manipulating the quantum state.
pub mod matrix_ops;
/// Probabilities, collapse, and repeated sampling of the quantum state.
pub mod measurement_ops;
/// The operator representation consumed by the simulator.
pub mod ops;

pub use ops::MatrixOp;
