use crate::utils::{full_to_sub, get_flat_index, register_value, sub_to_full, with_register_value};
use num_traits::Zero;
use std::fmt;
use std::iter::Sum;
use std::ops::Mul;

/// Ops which can be applied to quantum states.
#[derive(Clone)]
pub enum MatrixOp<P> {
    /// Indices, Matrix data
    Matrix(Vec<usize>, Vec<P>),
    /// Indices, for each output register value the input register value it is taken from.
    Permutation(Vec<usize>, Vec<usize>),
    /// Control indices, control state, Op
    Control(Vec<usize>, usize, Box<MatrixOp<P>>),
}

impl<P> MatrixOp<P>
where
    P: Clone + Zero + Sum + Mul<Output = P>,
{
    /// Compute the output amplitude at basis state `row` of an `n` qubit circuit.
    /// `f` maps a basis state of the input to its amplitude.
    pub fn value_for_row<F>(&self, n: usize, row: usize, f: &F) -> P
    where
        F: Fn(usize) -> P,
    {
        match self {
            MatrixOp::Matrix(indices, data) => {
                let nindices = indices.len();
                let matrow = full_to_sub(n, indices, row);
                (0..1usize << nindices)
                    .filter_map(|col| {
                        let val = &data[get_flat_index(nindices, matrow, col)];
                        if val.is_zero() {
                            None
                        } else {
                            Some(val.clone() * f(sub_to_full(n, indices, col, row)))
                        }
                    })
                    .sum()
            }
            MatrixOp::Permutation(indices, source) => {
                let value = register_value(n, indices, row);
                f(with_register_value(n, indices, source[value], row))
            }
            MatrixOp::Control(c_indices, state, op) => {
                if register_value(n, c_indices, row) == *state {
                    op.value_for_row(n, row, f)
                } else {
                    f(row)
                }
            }
        }
    }
}

impl<P> fmt::Debug for MatrixOp<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, indices) = match self {
            MatrixOp::Matrix(indices, _) => ("Matrix".to_string(), indices.clone()),
            MatrixOp::Permutation(indices, _) => ("Permutation".to_string(), indices.clone()),
            MatrixOp::Control(c_indices, state, op) => {
                let name = format!("C{:b}({:?})", state, op);
                (name, c_indices.clone())
            }
        };
        let int_strings = indices
            .iter()
            .map(|x| x.to_string())
            .collect::<Vec<String>>();

        write!(f, "{}[{}]", name, int_strings.join(", "))
    }
}
