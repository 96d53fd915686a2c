use crate::errors::{CircuitError, CircuitResult};
use crate::types::Precision;
use num_complex::Complex;
use num_traits::{One, Zero};
use std::fmt::Debug;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Standard functions needed by registers containing multiple qubits.
pub trait QubitRegister {
    /// Size of the register in qubits.
    fn n(&self) -> usize;
    /// Absolute indices represented by the register.
    fn indices(&self) -> &[usize];
}

/// Result of splitting a register in two.
#[derive(Debug)]
pub enum SplitResult<R: QubitRegister + Debug> {
    /// All registers were selected
    SELECTED(R),
    /// None of the registers were selected
    UNSELECTED(R),
    /// Some registers were selected, some were not selected.
    SPLIT(R, R),
}

/// Result of splitting a register into multiple registers.
#[derive(Debug)]
pub enum SplitManyResult<R: QubitRegister + Debug> {
    /// All registers were selected.
    AllSelected(Vec<R>),
    /// Some were selected, remaining were not.
    Remaining(Vec<R>, R),
}

impl<R: QubitRegister + Debug> SplitManyResult<R> {
    /// Returns select and unselected registers.
    pub fn get_all_selected(self) -> Result<Vec<R>, Vec<R>> {
        match self {
            SplitManyResult::AllSelected(v) => Ok(v),
            SplitManyResult::Remaining(v, _) => Err(v),
        }
    }
}

/// A base-level circuit builder trait, requiring definitions of registers, base circuit objects,
/// and end-result quantum state.
pub trait CircuitBuilder {
    /// The register type used for the circuit.
    type Register: QubitRegister + Debug;
    /// The struct used to represent circuit objects.
    type CircuitObject;
    /// Return type for state calculations.
    type StateCalculation;

    /// Number of qubits in circuit.
    fn n(&self) -> usize;

    /// Construct a single qubit.
    fn qubit(&mut self) -> Self::Register {
        self.register(NonZeroUsize::MIN)
    }

    /// Construct a register with multiple qubits. Fails if n=0.
    fn qudit(&mut self, n: usize) -> Option<Self::Register> {
        NonZeroUsize::new(n).map(|n| self.register(n))
    }

    /// Construct a register with multiple qubits.
    fn register(&mut self, n: NonZeroUsize) -> Self::Register;

    /// Merge two registers into a single register with first the r1 indices, then the r2 indices.
    fn merge_two_registers(&mut self, r1: Self::Register, r2: Self::Register) -> Self::Register;

    /// Merge multiple registers together into a single register, returns None if none given.
    fn merge_registers<It>(&mut self, rs: It) -> Option<Self::Register>
    where
        It: IntoIterator<Item = Self::Register>,
    {
        rs.into_iter().fold(None, |acc, r1| match acc {
            Some(r2) => Some(self.merge_two_registers(r2, r1)),
            None => Some(r1),
        })
    }

    /// Split a register into two, selecting the relative indices from the `indices` iterator.
    fn split_register_relative<It>(
        &mut self,
        r: Self::Register,
        indices: It,
    ) -> SplitResult<Self::Register>
    where
        It: IntoIterator<Item = usize>;

    /// Split the register into `r.n()` individual registers of 1 qubit each.
    fn split_all_register(&mut self, r: Self::Register) -> Vec<Self::Register> {
        split_helper(self, r, vec![])
    }

    /// Split off the last qubit from the register, returns the remaining register (or the
    /// whole register if it held one qubit) and the last qubit.
    fn split_last_qubit(&mut self, r: Self::Register) -> (Self::Register, Option<Self::Register>) {
        let n = r.n();
        match self.split_register_relative(r, [n - 1]) {
            SplitResult::SELECTED(r) => (r, None),
            SplitResult::SPLIT(ra, rb) => (rb, Some(ra)),
            SplitResult::UNSELECTED(_) => unreachable!(),
        }
    }

    /// Split into multiple registers, each with relative indices given by the sub-iterators.
    fn split_relative_index_groups<
        It: IntoIterator<Item = Itt>,
        Itt: IntoIterator<Item = usize>,
    >(
        &mut self,
        r: Self::Register,
        indices: It,
    ) -> SplitManyResult<Self::Register> {
        let mut rs = self
            .split_all_register(r)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        let selected_rs = indices
            .into_iter()
            .flat_map(|is| {
                let subrs = is.into_iter().flat_map(|i| rs[i].take());
                self.merge_registers(subrs)
            })
            .collect();
        let remaining_rs = self.merge_registers(rs.into_iter().flatten());
        match remaining_rs {
            None => SplitManyResult::AllSelected(selected_rs),
            Some(r) => SplitManyResult::Remaining(selected_rs, r),
        }
    }

    /// Apply a circuit object to the circuit directly.
    fn apply_circuit_object(
        &mut self,
        r: Self::Register,
        c: Self::CircuitObject,
    ) -> CircuitResult<Self::Register>;

    /// Calculate the quantum state at the end of the circuit, using |0> as input.
    fn calculate_state(&mut self) -> Self::StateCalculation {
        self.calculate_state_with_init(None)
    }

    /// Calculate the state at the end of the circuit using an initial state given by each register
    /// and the classical state in that register.
    fn calculate_state_with_init<'a, It>(&mut self, it: It) -> Self::StateCalculation
    where
        Self::Register: 'a,
        It: IntoIterator<Item = (&'a Self::Register, usize)>;
}

fn split_helper<CB>(cb: &mut CB, r: CB::Register, mut acc: Vec<CB::Register>) -> Vec<CB::Register>
where
    CB: CircuitBuilder + ?Sized,
{
    match cb.split_register_relative(r, Some(0)) {
        SplitResult::SELECTED(r) => {
            acc.push(r);
            acc
        }
        SplitResult::SPLIT(r0, r) => {
            acc.push(r0);
            split_helper(cb, r, acc)
        }
        SplitResult::UNSELECTED(_) => unreachable!(),
    }
}

/// Standard functions for building unitary circuits.
pub trait UnitaryBuilder<P: Precision>: CircuitBuilder {
    /// Make a circuit object out of an arbitrary matrix
    /// Single Qubit matrix is organized as  |0><0|, |0><1|, |1><0|, |1><1|
    fn matrix_to_circuitobject<const N: usize>(
        n: usize,
        data: [Complex<P>; N],
    ) -> Self::CircuitObject {
        Self::vec_matrix_to_circuitobject(n, data.to_vec())
    }

    /// Make a circuit object out of an arbitrary matrix
    /// Single Qubit matrix is organized as  |0><0|, |0><1|, |1><0|, |1><1|
    fn vec_matrix_to_circuitobject(n: usize, data: Vec<Complex<P>>) -> Self::CircuitObject;

    /// Make a circuit object which moves register value `i` to `table[i]`.
    fn permutation_to_circuitobject(n: usize, table: Arc<[usize]>) -> Self::CircuitObject;

    /// Apply a basis permutation to `r`: register value `i` becomes `table[i]`.
    fn apply_permutation(
        &mut self,
        r: Self::Register,
        table: Arc<[usize]>,
    ) -> CircuitResult<Self::Register> {
        let n = r.n();
        if table.len() != 1 << n {
            Err(CircuitError::new(format!(
                "Permutation table has {:?} entries but register has {:?} qubits",
                table.len(),
                n
            )))
        } else {
            self.apply_circuit_object(r, Self::permutation_to_circuitobject(n, table))
        }
    }
}

/// A Builder which can construct the Clifford elements used by amplitude amplification.
pub trait CliffordBuilder<P: Precision>: UnitaryBuilder<P> {
    /// Make a circuit object representing the X gate on a single qubit.
    /// Equivalent to calling `matrix_to_circuitobject` with \[0, 1, 1, 0\]
    fn make_x(&self) -> Self::CircuitObject {
        Self::matrix_to_circuitobject(
            1,
            [
                Complex::zero(),
                Complex::one(),
                Complex::one(),
                Complex::zero(),
            ],
        )
    }

    /// Make a circuit object representing the Z gate on a single qubit.
    /// Equivalent to calling `matrix_to_circuitobject` with \[1, 0, 0, -1\]
    fn make_z(&self) -> Self::CircuitObject {
        Self::matrix_to_circuitobject(
            1,
            [
                Complex::one(),
                Complex::zero(),
                Complex::zero(),
                -Complex::one(),
            ],
        )
    }

    /// Make a circuit object representing the H gate on a single qubit.
    /// Equivalent to calling `matrix_to_circuitobject` with \[1, 1, 1, -1\]/sqrt(2)
    fn make_h(&self) -> Self::CircuitObject {
        let l = Complex::one() * P::from(std::f64::consts::FRAC_1_SQRT_2).unwrap_or_else(P::zero);
        Self::matrix_to_circuitobject(1, [l, l, l, -l])
    }

    /// Create and apply an X (or NOT) gate circuit object.
    fn x(&mut self, r: Self::Register) -> CircuitResult<Self::Register> {
        let co = self.make_x();
        self.apply_circuit_object(r, co)
    }

    /// Create and apply a Z gate circuit object.
    fn z(&mut self, r: Self::Register) -> CircuitResult<Self::Register> {
        let co = self.make_z();
        self.apply_circuit_object(r, co)
    }

    /// Create and apply an H gate circuit object.
    fn h(&mut self, r: Self::Register) -> CircuitResult<Self::Register> {
        let co = self.make_h();
        self.apply_circuit_object(r, co)
    }
}

/// A builder that can take destructive measurements.
pub trait MeasurementBuilder: CircuitBuilder {
    /// Handle which points to measurements.
    type MeasurementHandle;
    /// Take a measurement of `r`, return `r` and a handle to fetch the result later.
    fn measure(&mut self, r: Self::Register) -> (Self::Register, Self::MeasurementHandle);
}
