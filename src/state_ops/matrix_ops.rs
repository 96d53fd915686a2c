#[cfg(feature = "parallel")]
pub(crate) use rayon::prelude::*;

use crate::errors::{CircuitError, CircuitResult};
use crate::iter_mut;
use crate::state_ops::ops::MatrixOp;
use crate::{Complex, Precision};
use num_traits::Zero;
use std::iter::Sum;
use std::ops::Mul;

/// Make a Matrix MatrixOp
pub fn make_matrix_op<P>(indices: Vec<usize>, dat: Vec<P>) -> CircuitResult<MatrixOp<P>> {
    let n = indices.len();
    let expected_mat_size = 1 << (2 * n);
    if indices.is_empty() {
        Err(CircuitError::new("Must supply at least one op index"))
    } else if dat.len() != expected_mat_size {
        let message = format!(
            "Matrix data has {:?} entries versus expected 2^2*{:?}",
            dat.len(),
            n
        );
        Err(CircuitError::new(message))
    } else {
        Ok(MatrixOp::Matrix(indices, dat))
    }
}

/// Make a Permutation MatrixOp from a table mapping each input register value to its output
/// register value. The `k`th qubit in `indices` is bit `k` of the register value.
pub fn make_permutation_op<P>(indices: Vec<usize>, forward: &[usize]) -> CircuitResult<MatrixOp<P>> {
    let n = indices.len();
    let expected_size = 1 << n;
    if indices.is_empty() {
        return Err(CircuitError::new("Must supply at least one op index"));
    }
    if forward.len() != expected_size {
        let message = format!(
            "Permutation table has {:?} entries versus expected 2^{:?}",
            forward.len(),
            n
        );
        return Err(CircuitError::new(message));
    }
    let mut source = vec![expected_size; expected_size];
    forward.iter().enumerate().try_for_each(|(from, to)| {
        if *to >= expected_size {
            Err(CircuitError::new(format!(
                "Permutation maps {:?} outside of the register ({:?})",
                from, to
            )))
        } else if source[*to] != expected_size {
            Err(CircuitError::new(format!(
                "Permutation maps both {:?} and {:?} to {:?}",
                source[*to], from, to
            )))
        } else {
            source[*to] = from;
            Ok(())
        }
    })?;
    Ok(MatrixOp::Permutation(indices, source))
}

/// Make a Control MatrixOp, `op` is applied when the qubits at `c_indices` hold `c_state`.
pub fn make_control_op<P>(
    mut c_indices: Vec<usize>,
    c_state: usize,
    op: MatrixOp<P>,
) -> CircuitResult<MatrixOp<P>> {
    if c_indices.is_empty() {
        Err(CircuitError::new("Must supply at least one control index"))
    } else if c_state >> c_indices.len() != 0 {
        let message = format!(
            "Control state {:b} does not fit in {:?} control qubits",
            c_state,
            c_indices.len()
        );
        Err(CircuitError::new(message))
    } else {
        let num_c_indices = c_indices.len();
        match op {
            MatrixOp::Control(oc_indices, oc_state, op) => {
                c_indices.extend(oc_indices);
                Ok(MatrixOp::Control(
                    c_indices,
                    c_state | (oc_state << num_c_indices),
                    op,
                ))
            }
            op => Ok(MatrixOp::Control(c_indices, c_state, Box::new(op))),
        }
    }
}

/// Apply `op` to the `input`, storing the results in `output`.
pub fn apply_op<P>(n: usize, op: &MatrixOp<P>, input: &[P], output: &mut [P])
where
    P: Clone + Zero + Sum + Mul<Output = P> + Send + Sync,
{
    let f = |index: usize| input[index].clone();
    iter_mut!(output)
        .enumerate()
        .for_each(|(row, outputloc)| *outputloc = op.value_for_row(n, row, &f));
}

/// Make a vector of complex numbers whose reals are given by `data`
pub fn from_reals<P: Precision>(data: &[P]) -> Vec<Complex<P>> {
    data.iter()
        .map(|x| Complex::<P> {
            re: *x,
            im: P::zero(),
        })
        .collect()
}
