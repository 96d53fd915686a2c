use crate::errors::CircuitResult;
use crate::puzzle::circuit::{apply_moves, diffusion, oracle, SearchBuilder, SearchRegisters};
use crate::puzzle::layout::SearchLayout;
use crate::puzzle::rules::RuleOperator;
use crate::types::Precision;
use std::f64::consts::FRAC_PI_4;
use std::sync::Arc;

/// Oracle and diffusion rounds for `marked` solutions among `search_space` candidates,
/// `max(1, round(pi/4 * sqrt(search_space / max(marked, 1))))`.
/// ```
/// use qpuzzle::puzzle::amplification::optimal_iterations;
///
/// assert_eq!(optimal_iterations(16, 1), 3);
/// assert_eq!(optimal_iterations(1, 1), 1);
/// assert_eq!(optimal_iterations(64, 0), 6);
/// ```
pub fn optimal_iterations(search_space: usize, marked: usize) -> usize {
    let ratio = search_space as f64 / marked.max(1) as f64;
    let rounds = (FRAC_PI_4 * ratio.sqrt()).round() as usize;
    rounds.max(1)
}

/// Run `iterations` rounds of moves, oracle, undo and diffusion, then a last forward pass so the
/// state register holds the arrangement each selector value leads to.
pub fn amplify<P, B>(
    b: &mut B,
    regs: SearchRegisters<B::Register>,
    operators: &[Arc<RuleOperator>],
    layout: &SearchLayout,
    goal_index: usize,
    iterations: usize,
) -> CircuitResult<SearchRegisters<B::Register>>
where
    P: Precision,
    B: SearchBuilder<P>,
{
    let regs = (0..iterations).try_fold(regs, |regs, round| {
        tracing::trace!(round, "amplification round");
        let regs = apply_moves::<P, B>(b, regs, operators, layout, true)?;
        let regs = oracle::<P, B>(b, regs, goal_index)?;
        let regs = apply_moves::<P, B>(b, regs, operators, layout, false)?;
        diffusion::<P, B>(b, regs)
    })?;
    apply_moves::<P, B>(b, regs, operators, layout, true)
}
