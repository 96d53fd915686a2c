use crate::builder_traits::{CircuitBuilder, CliffordBuilder, QubitRegister, UnitaryBuilder};
use crate::conditioning::Conditionable;
use crate::errors::{CircuitError, CircuitResult};
use crate::puzzle::layout::SearchLayout;
use crate::puzzle::rules::RuleOperator;
use crate::types::Precision;
use std::sync::Arc;

/// Builders able to assemble a search circuit.
pub trait SearchBuilder<P: Precision>: CliffordBuilder<P> + Conditionable {}

impl<P: Precision, B> SearchBuilder<P> for B where B: CliffordBuilder<P> + Conditionable {}

/// Registers of a search circuit: the state register and one selector block per step. `steps`
/// is empty when no selector qubits are needed.
#[derive(Debug)]
pub struct SearchRegisters<R> {
    /// Holds the Lehmer index of the current arrangement.
    pub state: R,
    /// Selector block per step, in step order.
    pub steps: Vec<R>,
}

impl<R: QubitRegister + std::fmt::Debug> SearchRegisters<R> {
    /// Merge everything into one register, state first then the steps in order, so the value it
    /// holds matches [`SearchLayout::split_sample`].
    pub fn merge<B>(self, b: &mut B) -> R
    where
        B: CircuitBuilder<Register = R>,
    {
        let state = self.state;
        self.steps
            .into_iter()
            .fold(state, |acc, r| b.merge_two_registers(acc, r))
    }
}

/// Apply X to the qubits of `r` whose bit is set in `pattern`.
pub fn flip_bits<P, B>(b: &mut B, r: B::Register, pattern: usize) -> CircuitResult<B::Register>
where
    P: Precision,
    B: CliffordBuilder<P>,
{
    if pattern == 0 {
        return Ok(r);
    }
    let qubits = b
        .split_all_register(r)
        .into_iter()
        .enumerate()
        .map(|(k, q)| if (pattern >> k) & 1 == 1 { b.x(q) } else { Ok(q) })
        .collect::<CircuitResult<Vec<_>>>()?;
    b.merge_registers(qubits)
        .ok_or_else(|| CircuitError::new("Cannot flip bits of an empty register"))
}

/// Negate the amplitude of every branch where all qubits of `r` are `|1>`.
pub fn flip_phase_if_all_ones<P, B>(b: &mut B, r: B::Register) -> CircuitResult<B::Register>
where
    P: Precision,
    B: SearchBuilder<P>,
{
    match b.split_last_qubit(r) {
        (r, None) => b.z(r),
        (rest, Some(last)) => {
            let mut cb = b.condition_with(rest);
            let last = CliffordBuilder::<P>::z(&mut cb, last)?;
            let rest = cb.dissolve();
            Ok(b.merge_two_registers(rest, last))
        }
    }
}

/// Allocate the search registers, write `start_index` into the state register and put every
/// selector qubit into uniform superposition.
pub fn prepare<P, B>(
    b: &mut B,
    layout: &SearchLayout,
    start_index: usize,
) -> CircuitResult<SearchRegisters<B::Register>>
where
    P: Precision,
    B: SearchBuilder<P>,
{
    let state = b
        .qudit(layout.state_qubits)
        .ok_or_else(|| CircuitError::new("The state register needs at least one qubit"))?;
    let state = flip_bits::<P, B>(b, state, start_index)?;
    let steps = (0..layout.depth)
        .filter_map(|_| b.qudit(layout.bits_per_rule))
        .collect::<Vec<_>>();
    let steps = steps
        .into_iter()
        .map(|r| b.h(r))
        .collect::<CircuitResult<Vec<_>>>()?;
    tracing::trace!(
        state_qubits = layout.state_qubits,
        selector_blocks = steps.len(),
        start_index,
        "prepared search registers"
    );
    Ok(SearchRegisters { state, steps })
}

/// Apply one rule per step to the state register, the rule chosen by the step's selector block.
///
/// Going forward the steps run in order, each rule fires when its block holds the rule's value.
/// Going backward the steps run in reverse with the inverse tables, undoing a forward pass.
/// With a single rule there are no selector blocks and the rule is applied at every step.
pub fn apply_moves<P, B>(
    b: &mut B,
    regs: SearchRegisters<B::Register>,
    operators: &[Arc<RuleOperator>],
    layout: &SearchLayout,
    forward: bool,
) -> CircuitResult<SearchRegisters<B::Register>>
where
    P: Precision,
    B: SearchBuilder<P>,
{
    let SearchRegisters { mut state, steps } = regs;
    let mut steps = steps.into_iter().map(Some).collect::<Vec<_>>();

    let step_order = ordered(layout.depth, forward);
    let rule_order = ordered(operators.len(), forward);
    for step in step_order {
        for value in rule_order.iter().cloned() {
            let table = operators[value].table(forward);
            if layout.bits_per_rule == 0 {
                state = b.apply_permutation(state, table)?;
                continue;
            }
            let selector = steps
                .get_mut(step)
                .and_then(Option::take)
                .ok_or_else(|| CircuitError::new(format!("Missing selector for step {}", step)))?;
            let mut cb = b.condition_with_state(selector, value)?;
            state = UnitaryBuilder::<P>::apply_permutation(&mut cb, state, table)?;
            steps[step] = Some(cb.dissolve());
        }
    }
    tracing::trace!(forward, depth = layout.depth, "applied move steps");

    Ok(SearchRegisters {
        state,
        steps: steps.into_iter().flatten().collect(),
    })
}

fn ordered(len: usize, forward: bool) -> Vec<usize> {
    if forward {
        (0..len).collect()
    } else {
        (0..len).rev().collect()
    }
}

/// Phase flip the branches whose state register holds `goal_index`.
pub fn oracle<P, B>(
    b: &mut B,
    regs: SearchRegisters<B::Register>,
    goal_index: usize,
) -> CircuitResult<SearchRegisters<B::Register>>
where
    P: Precision,
    B: SearchBuilder<P>,
{
    let SearchRegisters { state, steps } = regs;
    let mask = (1 << state.n()) - 1;
    let zeros = !goal_index & mask;
    let state = flip_bits::<P, B>(b, state, zeros)?;
    let state = flip_phase_if_all_ones::<P, B>(b, state)?;
    let state = flip_bits::<P, B>(b, state, zeros)?;
    Ok(SearchRegisters { state, steps })
}

/// Reflect the selector blocks about their uniform superposition. The state register is left
/// alone.
pub fn diffusion<P, B>(
    b: &mut B,
    regs: SearchRegisters<B::Register>,
) -> CircuitResult<SearchRegisters<B::Register>>
where
    P: Precision,
    B: SearchBuilder<P>,
{
    let SearchRegisters { state, steps } = regs;
    let widths = steps.iter().map(|r| r.n()).collect::<Vec<_>>();
    let selector = match b.merge_registers(steps) {
        Some(r) => r,
        None => {
            return Ok(SearchRegisters {
                state,
                steps: vec![],
            })
        }
    };

    let selector = b.h(selector)?;
    let selector = b.x(selector)?;
    let selector = flip_phase_if_all_ones::<P, B>(b, selector)?;
    let selector = b.x(selector)?;
    let selector = b.h(selector)?;

    let groups = widths
        .iter()
        .scan(0, |offset, width| {
            let group = *offset..*offset + width;
            *offset += width;
            Some(group)
        })
        .collect::<Vec<_>>();
    let steps = b
        .split_relative_index_groups(selector, groups)
        .get_all_selected()
        .map_err(|_| CircuitError::new("Selector blocks did not cover the selector register"))?;
    Ok(SearchRegisters { state, steps })
}

#[cfg(test)]
mod circuit_tests {
    use super::*;
    use crate::builder::LocalBuilder;
    use crate::puzzle::codec::{encode, Permutation};
    use crate::puzzle::rules::{MoveRule, RuleSet};
    use crate::state_ops::measurement_ops::measure_probs;

    fn assert_almost_eq(a: f64, b: f64, prec: i32) {
        let mult = 10.0f64.powi(prec);
        let (a, b) = (a * mult, b * mult);
        let (a, b) = (a.round(), b.round());
        assert_eq!(a / mult, b / mult);
    }

    #[test]
    fn test_flip_bits_sets_value() -> CircuitResult<()> {
        let mut b = LocalBuilder::<f64>::default();
        let r = b.qudit(3).unwrap();
        let r = flip_bits::<f64, _>(&mut b, r, 0b101)?;
        let (state, _) = b.calculate_state()?;
        let probs = measure_probs(3, r.indices(), &state);
        assert_eq!(probs[0b101], 1.0);
        Ok(())
    }

    #[test]
    fn test_flip_phase_only_all_ones() -> CircuitResult<()> {
        let mut b = LocalBuilder::<f64>::default();
        let r = b.qudit(2).unwrap();
        let r = b.h(r)?;
        let r = flip_phase_if_all_ones::<f64, _>(&mut b, r)?;
        let (state, _) = b.calculate_state()?;
        // Only |11> is negated.
        assert!(state[0b00].re > 0.0);
        assert!(state[0b01].re > 0.0);
        assert!(state[0b10].re > 0.0);
        assert!(state[0b11].re < 0.0);
        assert_eq!(r.n(), 2);
        Ok(())
    }

    #[test]
    fn test_forward_then_backward_is_identity() -> Result<(), crate::errors::SearchError> {
        let start = Permutation::new(vec![1, 2, 3, 0])?;
        let rules = RuleSet::two_by_two();
        let layout = SearchLayout::new(4, rules.len(), 2)?;
        let operators = rules
            .rules()
            .iter()
            .map(|r| RuleOperator::synthesize(*r, 4, 0).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let mut b = LocalBuilder::<f64>::default();
        let regs = prepare::<f64, _>(&mut b, &layout, encode(&start))?;
        let regs = apply_moves::<f64, _>(&mut b, regs, &operators, &layout, true)?;
        let regs = apply_moves::<f64, _>(&mut b, regs, &operators, &layout, false)?;
        let state_indices = regs.state.indices().to_vec();
        let (state, _) = b.calculate_state()?;
        let probs = measure_probs(layout.total_qubits(), &state_indices, &state);
        assert_almost_eq(probs[encode(&start)], 1.0, 10);
        Ok(())
    }

    #[test]
    fn test_single_rule_applies_every_step() -> Result<(), crate::errors::SearchError> {
        let start = Permutation::new(vec![1, 0, 2])?;
        let rule = MoveRule::new(0, 1);
        let layout = SearchLayout::new(3, 1, 3)?;
        let operators = vec![Arc::new(RuleOperator::synthesize(rule, 3, 0)?)];

        let mut b = LocalBuilder::<f64>::default();
        let regs = prepare::<f64, _>(&mut b, &layout, encode(&start))?;
        assert!(regs.steps.is_empty());
        let regs = apply_moves::<f64, _>(&mut b, regs, &operators, &layout, true)?;
        let (state, _) = b.calculate_state()?;
        let probs = measure_probs(layout.total_qubits(), regs.state.indices(), &state);
        // Three swaps of the same pair leave it swapped once.
        let expected = encode(&Permutation::new(vec![0, 1, 2])?);
        assert_almost_eq(probs[expected], 1.0, 10);
        Ok(())
    }

    #[test]
    fn test_diffusion_keeps_uniform() -> CircuitResult<()> {
        let layout = SearchLayout::new(2, 4, 2).map_err(|e| CircuitError::new(e.to_string()))?;
        let mut b = LocalBuilder::<f64>::default();
        let regs = prepare::<f64, _>(&mut b, &layout, 0)?;
        let regs = diffusion::<f64, _>(&mut b, regs)?;
        assert_eq!(regs.steps.len(), 2);
        assert!(regs.steps.iter().all(|r| r.n() == 2));
        let merged = regs.merge(&mut b);
        let (state, _) = b.calculate_state()?;
        let probs = measure_probs(layout.total_qubits(), merged.indices(), &state);
        // The uniform superposition is an eigenvector of the reflection.
        (0..16).for_each(|s| assert_almost_eq(probs[layout.join_sample(0, s)], 1.0 / 16.0, 10));
        Ok(())
    }
}
