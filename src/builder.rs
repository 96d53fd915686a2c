use std::num::NonZeroUsize;
use std::sync::Arc;

use num_traits::{One, Zero};
use rand::Rng;

use crate::builder_traits::*;
use crate::conditioning::Conditionable;
use crate::errors::{CircuitError, CircuitResult};
use crate::state_ops::matrix_ops::{
    apply_op, make_control_op, make_matrix_op, make_permutation_op,
};
use crate::state_ops::measurement_ops::{measure, sample_counts};
use crate::state_ops::MatrixOp;
use crate::types::Precision;
use crate::utils::with_register_value;
use crate::Complex;

/// A local circuit builder for constructing circuits out of standard gates and basis
/// permutations, simulated on a dense state vector.
#[derive(Default, Debug)]
pub struct LocalBuilder<P: Precision> {
    pipeline: Vec<(Vec<usize>, BuilderCircuitObject<P>)>,
    n: usize,
    measurements: usize,
}

impl<P: Precision> LocalBuilder<P> {
    /// Returns the depth of the current circuit (pipeline).
    pub fn pipeline_depth(&self) -> usize {
        self.pipeline.len()
    }

    /// Run the circuit once from the initial state given by each register and the classical
    /// value in that register. Measurements collapse the state, drawing outcomes from `rng`.
    pub fn calculate_state_with_rng<'a, It, R>(
        &mut self,
        it: It,
        rng: &mut R,
    ) -> CircuitResult<(Vec<Complex<P>>, Measurements<P>)>
    where
        It: IntoIterator<Item = (&'a Qudit, usize)>,
        R: Rng + ?Sized,
    {
        let n = self.n;
        let state = self.initial_state(it);
        let arena = state.clone();

        let (state, _, measurements) = self.pipeline.iter().try_fold(
            (state, arena, vec![]),
            |(state, mut arena, mut measurements), (indices, obj)| -> CircuitResult<_> {
                match &obj.object {
                    BuilderCircuitObjectType::Unitary(object) => {
                        let uop = make_unitary_op(indices, object)?;
                        apply_op(n, &uop, &state, &mut arena);
                    }
                    BuilderCircuitObjectType::Measurement => {
                        let (measured, p) = measure(n, indices, &state, &mut arena, &mut *rng);
                        measurements.push(MeasurementResults::Single(measured, p));
                    }
                }
                Ok((arena, state, measurements))
            },
        )?;
        Ok((state, Measurements { measurements }))
    }

    /// Run the circuit `shots` times from the initial state given by each register and the
    /// classical value in that register. Every measurement must come after the last unitary;
    /// each is sampled from the final state without collapsing it.
    pub fn sample_with_init<'a, It, R>(
        &mut self,
        it: It,
        shots: usize,
        rng: &mut R,
    ) -> CircuitResult<(Vec<Complex<P>>, Measurements<P>)>
    where
        It: IntoIterator<Item = (&'a Qudit, usize)>,
        R: Rng + ?Sized,
    {
        let first_measurement = self
            .pipeline
            .iter()
            .position(|(_, obj)| obj.is_measurement())
            .unwrap_or(self.pipeline.len());
        if self.pipeline[first_measurement..]
            .iter()
            .any(|(_, obj)| !obj.is_measurement())
        {
            return Err(CircuitError::new(
                "Sampling requires all measurements at the end of the circuit",
            ));
        }

        let n = self.n;
        let mut state = self.initial_state(it);
        let mut arena = state.clone();
        for (indices, obj) in &self.pipeline[..first_measurement] {
            if let BuilderCircuitObjectType::Unitary(object) = &obj.object {
                let uop = make_unitary_op(indices, object)?;
                apply_op(n, &uop, &state, &mut arena);
                std::mem::swap(&mut state, &mut arena);
            }
        }

        let measurements = self.pipeline[first_measurement..]
            .iter()
            .map(|(indices, _)| {
                MeasurementResults::Sampled(sample_counts(n, indices, &state, shots, rng))
            })
            .collect();
        tracing::trace!(
            qubits = n,
            depth = self.pipeline.len(),
            shots,
            "sampled circuit"
        );
        Ok((state, Measurements { measurements }))
    }

    fn initial_state<'a, It>(&self, it: It) -> Vec<Complex<P>>
    where
        It: IntoIterator<Item = (&'a Qudit, usize)>,
    {
        let n = self.n;
        let mut state = vec![Complex::zero(); 1 << n];
        let initial_index = it.into_iter().fold(0, |acc, (r, x)| {
            with_register_value(n, &r.indices, x, acc)
        });
        state[initial_index] = Complex::one();
        state
    }

    fn push_conditioned(
        &mut self,
        cr: &Qudit,
        c_state: usize,
        r: &Qudit,
        unit: UnitaryMatrixObject<P>,
    ) {
        let ncr = cr.n();
        let object = match unit {
            UnitaryMatrixObject::Controlled(k, state, op) => {
                UnitaryMatrixObject::Controlled(ncr + k, c_state | (state << ncr), op)
            }
            unit => UnitaryMatrixObject::Controlled(ncr, c_state, Box::new(unit)),
        };
        let indices = cr
            .indices
            .iter()
            .chain(r.indices.iter())
            .cloned()
            .collect::<Vec<_>>();
        let co = BuilderCircuitObject {
            n: indices.len(),
            object: BuilderCircuitObjectType::Unitary(object),
        };
        self.pipeline.push((indices, co));
    }
}

/// The register implementation for the LocalBuilder.
#[derive(Debug)]
pub struct Qudit {
    indices: Vec<usize>,
}

impl QubitRegister for Qudit {
    fn n(&self) -> usize {
        self.indices.len()
    }

    fn indices(&self) -> &[usize] {
        self.indices.as_ref()
    }
}

impl Qudit {
    fn new<It>(indices: It) -> Option<Self>
    where
        It: Into<Vec<usize>>,
    {
        let indices = indices.into();
        if !indices.is_empty() {
            Some(Self { indices })
        } else {
            None
        }
    }
    fn new_from_iter<It>(indices: It) -> Option<Self>
    where
        It: Iterator<Item = usize>,
    {
        let indices = indices.into_iter().collect::<Vec<_>>();
        Self::new(indices)
    }
}

/// A pipeline object for the LocalBuilder.
#[derive(Debug, Clone)]
pub struct BuilderCircuitObject<P: Precision> {
    n: usize,
    object: BuilderCircuitObjectType<P>,
}

impl<P: Precision> BuilderCircuitObject<P> {
    fn is_measurement(&self) -> bool {
        matches!(self.object, BuilderCircuitObjectType::Measurement)
    }
}

/// The type of pipeline object for LocalBuilder.
#[derive(Debug, Clone)]
pub enum BuilderCircuitObjectType<P: Precision> {
    /// A unitary operation on the circuit.
    Unitary(UnitaryMatrixObject<P>),
    /// A measurement operation on the circuit.
    Measurement,
}

/// The type of unitary matrix for LocalBuilder.
#[derive(Debug, Clone)]
pub enum UnitaryMatrixObject<P: Precision> {
    /// A pauli X gate.
    X,
    /// A pauli Z gate.
    Z,
    /// A hadamard gate.
    H,
    /// A Generic Matrix
    MAT(Vec<Complex<P>>),
    /// A basis permutation, register value `i` goes to `table[i]`.
    Permutation(Arc<[usize]>),
    /// The inner object applied when the first `k` qubits hold the given state.
    Controlled(usize, usize, Box<UnitaryMatrixObject<P>>),
}

fn make_unitary_op<P: Precision>(
    indices: &[usize],
    object: &UnitaryMatrixObject<P>,
) -> CircuitResult<MatrixOp<Complex<P>>> {
    let l = Complex::one();
    let o = Complex::zero();
    match object {
        UnitaryMatrixObject::X => make_matrix_op(indices.to_vec(), vec![o, l, l, o]),
        UnitaryMatrixObject::Z => make_matrix_op(indices.to_vec(), vec![l, o, o, -l]),
        UnitaryMatrixObject::H => {
            let nl = l * P::from(std::f64::consts::FRAC_1_SQRT_2).unwrap_or_else(P::zero);
            make_matrix_op(indices.to_vec(), vec![nl, nl, nl, -nl])
        }
        UnitaryMatrixObject::MAT(data) => make_matrix_op(indices.to_vec(), data.clone()),
        UnitaryMatrixObject::Permutation(table) => make_permutation_op(indices.to_vec(), table),
        UnitaryMatrixObject::Controlled(k, state, op) => {
            if *k >= indices.len() {
                return Err(CircuitError::new("Controlled object has no target qubits"));
            }
            let (c_indices, op_indices) = indices.split_at(*k);
            make_control_op(c_indices.to_vec(), *state, make_unitary_op(op_indices, op)?)
        }
    }
}

/// Represents the result of a measurement on the circuit.
#[derive(Debug, Clone)]
pub enum MeasurementResults<P: Precision> {
    /// The result of a single measurement on selected qubits, returns the measurement as well as
    /// the likelyhood of that measurement taking place.
    Single(usize, P),
    /// Repeated samples of the selected qubits as `(value, count)` in first observed order.
    Sampled(Vec<(usize, usize)>),
}

/// A series of measurement results at the end of the circuit.
#[derive(Debug)]
pub struct Measurements<P: Precision> {
    measurements: Vec<MeasurementResults<P>>,
}

impl<P: Precision> Measurements<P> {
    /// Get a single-shot measurement result given a handle.
    pub fn get_measurement(&self, handle: MeasurementHandle) -> Option<(usize, P)> {
        match self.measurements.get(handle.id)? {
            MeasurementResults::Single(val, prob) => Some((*val, *prob)),
            MeasurementResults::Sampled(_) => None,
        }
    }

    /// Get the sampled counts for a measurement given a handle.
    pub fn get_counts(&self, handle: MeasurementHandle) -> Option<&[(usize, usize)]> {
        match self.measurements.get(handle.id)? {
            MeasurementResults::Single(_, _) => None,
            MeasurementResults::Sampled(counts) => Some(counts.as_slice()),
        }
    }
}

impl<P: Precision> CircuitBuilder for LocalBuilder<P> {
    type Register = Qudit;
    type CircuitObject = BuilderCircuitObject<P>;
    type StateCalculation = CircuitResult<(Vec<Complex<P>>, Measurements<P>)>;

    fn n(&self) -> usize {
        self.n
    }

    fn register(&mut self, n: NonZeroUsize) -> Self::Register {
        let n: usize = n.into();
        let r = Self::Register {
            indices: (self.n..self.n + n).collect(),
        };
        self.n += n;
        r
    }

    fn merge_two_registers(&mut self, r1: Self::Register, r2: Self::Register) -> Self::Register {
        let mut indices = r1.indices;
        indices.extend(r2.indices);
        Self::Register { indices }
    }

    fn split_register_relative<It>(
        &mut self,
        r: Self::Register,
        indices: It,
    ) -> SplitResult<Self::Register>
    where
        It: IntoIterator<Item = usize>,
    {
        let selected_indices = indices
            .into_iter()
            .filter_map(|i| r.indices.get(i).cloned())
            .collect::<Vec<_>>();
        let remaining_indices = r
            .indices
            .into_iter()
            .filter(|oi| !selected_indices.contains(oi));
        let r2 = Self::Register::new_from_iter(remaining_indices);
        let r1 = Self::Register::new(selected_indices);

        match (r1, r2) {
            (Some(r1), None) => SplitResult::SELECTED(r1),
            (None, Some(r2)) => SplitResult::UNSELECTED(r2),
            (Some(r1), Some(r2)) => SplitResult::SPLIT(r1, r2),
            (None, None) => unreachable!(),
        }
    }

    fn apply_circuit_object(
        &mut self,
        r: Self::Register,
        c: Self::CircuitObject,
    ) -> CircuitResult<Self::Register> {
        if c.n == 1 || c.n == r.n() {
            if c.n == 1 && r.n() > 1 {
                // Do broadcasting
                r.indices
                    .iter()
                    .for_each(|i| self.pipeline.push((vec![*i], c.clone())));
                Ok(r)
            } else {
                // Normal application.
                self.pipeline.push((r.indices.clone(), c));
                Ok(r)
            }
        } else {
            Err(CircuitError::new(
                "Matrix has incorrect N and cannot be broadcast",
            ))
        }
    }

    fn calculate_state_with_init<'a, It>(&mut self, it: It) -> Self::StateCalculation
    where
        Self::Register: 'a,
        It: IntoIterator<Item = (&'a Self::Register, usize)>,
    {
        self.calculate_state_with_rng(it, &mut rand::thread_rng())
    }
}

impl<P: Precision> UnitaryBuilder<P> for LocalBuilder<P> {
    fn vec_matrix_to_circuitobject(n: usize, data: Vec<Complex<P>>) -> Self::CircuitObject {
        Self::CircuitObject {
            n,
            object: BuilderCircuitObjectType::Unitary(UnitaryMatrixObject::MAT(data)),
        }
    }

    fn permutation_to_circuitobject(n: usize, table: Arc<[usize]>) -> Self::CircuitObject {
        Self::CircuitObject {
            n,
            object: BuilderCircuitObjectType::Unitary(UnitaryMatrixObject::Permutation(table)),
        }
    }
}

impl<P: Precision> CliffordBuilder<P> for LocalBuilder<P> {
    fn make_x(&self) -> Self::CircuitObject {
        Self::CircuitObject {
            n: 1,
            object: BuilderCircuitObjectType::Unitary(UnitaryMatrixObject::X),
        }
    }
    fn make_z(&self) -> Self::CircuitObject {
        Self::CircuitObject {
            n: 1,
            object: BuilderCircuitObjectType::Unitary(UnitaryMatrixObject::Z),
        }
    }
    fn make_h(&self) -> Self::CircuitObject {
        Self::CircuitObject {
            n: 1,
            object: BuilderCircuitObjectType::Unitary(UnitaryMatrixObject::H),
        }
    }
}

/// A handle which points to a measurement result.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementHandle {
    id: usize,
}

impl<P: Precision> MeasurementBuilder for LocalBuilder<P> {
    type MeasurementHandle = MeasurementHandle;

    fn measure(&mut self, r: Self::Register) -> (Self::Register, Self::MeasurementHandle) {
        let obj = BuilderCircuitObject {
            n: r.n(),
            object: BuilderCircuitObjectType::Measurement,
        };
        self.pipeline.push((r.indices.clone(), obj));
        let m = self.measurements;
        self.measurements += 1;
        (r, Self::MeasurementHandle { id: m })
    }
}

impl<P: Precision> Conditionable for LocalBuilder<P> {
    fn try_apply_with_condition(
        &mut self,
        cr: Self::Register,
        c_state: usize,
        r: Self::Register,
        co: Self::CircuitObject,
    ) -> Result<(Self::Register, Self::Register), (Self::Register, CircuitError)> {
        match co.object {
            BuilderCircuitObjectType::Unitary(unit) => {
                if co.n == r.n() {
                    self.push_conditioned(&cr, c_state, &r, unit);
                    Ok((cr, r))
                } else if co.n == 1 {
                    // Broadcast, each qubit receives its own conditioned copy.
                    let rs = self.split_all_register(r);
                    rs.iter()
                        .for_each(|q| self.push_conditioned(&cr, c_state, q, unit.clone()));
                    match self.merge_registers(rs) {
                        Some(r) => Ok((cr, r)),
                        None => {
                            let err = CircuitError::new("Cannot condition an empty register");
                            Err((cr, err))
                        }
                    }
                } else {
                    Err((
                        cr,
                        CircuitError::new("Matrix has incorrect N and cannot be broadcast"),
                    ))
                }
            }
            BuilderCircuitObjectType::Measurement => {
                Err((cr, CircuitError::new("Cannot condition measurements.")))
            }
        }
    }
}
