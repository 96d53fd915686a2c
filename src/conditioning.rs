use crate::builder_traits::{
    CircuitBuilder, CliffordBuilder, QubitRegister, SplitResult, UnitaryBuilder,
};
use crate::errors::{CircuitError, CircuitResult};
use crate::types::Precision;
use num_complex::Complex;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// A CircuitBuilder is conditionable if it can condition all unitaries with a given register.
pub trait Conditionable: CircuitBuilder {
    /// Attempt to condition a circuit object `co` applied to `r` with the register `cr` holding
    /// the value `c_state`. On failure `cr` is handed back alongside the error.
    fn try_apply_with_condition(
        &mut self,
        cr: Self::Register,
        c_state: usize,
        r: Self::Register,
        co: Self::CircuitObject,
    ) -> Result<(Self::Register, Self::Register), (Self::Register, CircuitError)>;

    /// Construct a new circuitbuilder which conditions all unitaries on every qubit of `cr`
    /// being `|1>`.
    fn condition_with(&mut self, cr: Self::Register) -> Conditioned<'_, Self> {
        let c_state = (1 << cr.n()) - 1;
        Conditioned::new(self, cr, c_state)
    }

    /// Construct a new circuitbuilder which conditions all unitaries on `cr` holding `c_state`,
    /// where qubit `k` of `cr` is bit `k` of `c_state`.
    fn condition_with_state(
        &mut self,
        cr: Self::Register,
        c_state: usize,
    ) -> CircuitResult<Conditioned<'_, Self>> {
        if c_state >> cr.n() != 0 {
            Err(CircuitError::new(format!(
                "Condition {:b} does not fit in a register of {:?} qubits",
                c_state,
                cr.n()
            )))
        } else {
            Ok(Conditioned::new(self, cr, c_state))
        }
    }
}

/// A CircuitBuilder which conditions all unitaries with a given register.
#[derive(Debug)]
pub struct Conditioned<'a, CB: Conditionable + ?Sized> {
    parent: &'a mut CB,
    cr: Option<CB::Register>,
    c_state: usize,
}

impl<'a, CB: Conditionable + ?Sized> Conditioned<'a, CB> {
    fn new(cb: &'a mut CB, cr: CB::Register, c_state: usize) -> Self {
        Self {
            parent: cb,
            cr: Some(cr),
            c_state,
        }
    }

    /// Dissolve the Conditioned circuit builder and retrieve the conditioning register.
    pub fn dissolve(mut self) -> CB::Register {
        match self.cr.take() {
            Some(cr) => cr,
            None => unreachable!("conditioning register is restored after every application"),
        }
    }

    fn take_cr(&mut self) -> CircuitResult<CB::Register> {
        self.cr
            .take()
            .ok_or_else(|| CircuitError::new("Conditioning register was not returned"))
    }
}

impl<'a, CB: Conditionable + ?Sized> CircuitBuilder for Conditioned<'a, CB> {
    type Register = CB::Register;
    type CircuitObject = CB::CircuitObject;
    type StateCalculation = CB::StateCalculation;

    fn n(&self) -> usize {
        self.parent.n()
    }

    fn register(&mut self, n: NonZeroUsize) -> Self::Register {
        self.parent.register(n)
    }

    fn merge_two_registers(&mut self, r1: Self::Register, r2: Self::Register) -> Self::Register {
        self.parent.merge_two_registers(r1, r2)
    }

    fn split_register_relative<It>(
        &mut self,
        r: Self::Register,
        indices: It,
    ) -> SplitResult<Self::Register>
    where
        It: IntoIterator<Item = usize>,
    {
        self.parent.split_register_relative(r, indices)
    }

    fn apply_circuit_object(
        &mut self,
        r: Self::Register,
        c: Self::CircuitObject,
    ) -> CircuitResult<Self::Register> {
        let cr = self.take_cr()?;
        match self.parent.try_apply_with_condition(cr, self.c_state, r, c) {
            Ok((cr, r)) => {
                self.cr = Some(cr);
                Ok(r)
            }
            Err((cr, err)) => {
                self.cr = Some(cr);
                Err(err)
            }
        }
    }

    fn calculate_state_with_init<'b, It>(&mut self, it: It) -> Self::StateCalculation
    where
        Self::Register: 'b,
        It: IntoIterator<Item = (&'b Self::Register, usize)>,
    {
        self.parent.calculate_state_with_init(it)
    }
}

impl<'a, P: Precision, CB: Conditionable + UnitaryBuilder<P> + ?Sized> UnitaryBuilder<P>
    for Conditioned<'a, CB>
{
    fn vec_matrix_to_circuitobject(n: usize, data: Vec<Complex<P>>) -> Self::CircuitObject {
        CB::vec_matrix_to_circuitobject(n, data)
    }

    fn permutation_to_circuitobject(n: usize, table: Arc<[usize]>) -> Self::CircuitObject {
        CB::permutation_to_circuitobject(n, table)
    }
}

impl<'a, P: Precision, CB: Conditionable + CliffordBuilder<P> + ?Sized> CliffordBuilder<P>
    for Conditioned<'a, CB>
{
    fn make_x(&self) -> Self::CircuitObject {
        self.parent.make_x()
    }
    fn make_z(&self) -> Self::CircuitObject {
        self.parent.make_z()
    }
    fn make_h(&self) -> Self::CircuitObject {
        self.parent.make_h()
    }
}

impl<'a, CB: Conditionable> Conditionable for Conditioned<'a, CB> {
    fn try_apply_with_condition(
        &mut self,
        cr: CB::Register,
        c_state: usize,
        r: CB::Register,
        co: CB::CircuitObject,
    ) -> Result<(CB::Register, CB::Register), (CB::Register, CircuitError)> {
        let ncr = cr.n();
        let ccr = match self.take_cr() {
            Ok(ccr) => ccr,
            Err(err) => return Err((cr, err)),
        };
        let cr = self.merge_two_registers(cr, ccr);
        let c_state = c_state | (self.c_state << ncr);
        let (merged, applied) = match self.parent.try_apply_with_condition(cr, c_state, r, co) {
            Ok((cr, r)) => (cr, Ok(r)),
            Err((cr, err)) => (cr, Err(err)),
        };
        let (cr, ccr) = match self.split_register_relative(merged, 0..ncr) {
            SplitResult::SPLIT(cr, ccr) => (cr, ccr),
            SplitResult::SELECTED(_) => unreachable!(),
            SplitResult::UNSELECTED(_) => unreachable!(),
        };
        self.cr = Some(ccr);
        match applied {
            Ok(r) => Ok((cr, r)),
            Err(err) => Err((cr, err)),
        }
    }
}
