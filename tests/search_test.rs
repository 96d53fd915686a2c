mod common;

use common::assert_almost_eq;
use qpuzzle::builder_traits::{CircuitBuilder, QubitRegister};
use qpuzzle::errors::{SearchError, SearchResult};
use qpuzzle::prelude::*;
use qpuzzle::puzzle::amplification::optimal_iterations;
use qpuzzle::puzzle::circuit::{apply_moves, prepare};
use qpuzzle::puzzle::classical::{count_marked, replay};
use qpuzzle::puzzle::codec::{decode, encode};
use qpuzzle::puzzle::decoder::decode_samples;
use qpuzzle::puzzle::rules::OperatorCache;
use qpuzzle::state_ops::measurement_ops::measure_probs;

#[test]
fn test_iteration_counts() {
    // Four rules, two steps.
    assert_eq!(optimal_iterations(16, 1), 3);
    // Depth zero.
    assert_eq!(optimal_iterations(1, 1), 1);
}

#[test]
fn test_decoder_round_trip() -> SearchResult<()> {
    let layout = SearchLayout::new(4, 4, 2)?;
    let goal = Permutation::new(vec![1, 2, 0, 3])?;
    let sequence = MoveSequence::new(vec![1, 2]);
    let raw = layout.join_sample(encode(&goal), sequence.to_selector(&layout));
    let outcomes = decode_samples(&layout, &[(raw, 1)])?;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].permutation, goal);
    assert_eq!(outcomes[0].sequence, sequence);
    assert_eq!(outcomes[0].count, 1);
    Ok(())
}

#[test]
fn test_classical_and_circuit_replay_agree() -> SearchResult<()> {
    common::init_tracing();
    let start = Permutation::new(vec![1, 2, 3, 0])?;
    let rules = RuleSet::two_by_two();
    let layout = SearchLayout::new(4, rules.len(), 2)?;
    let operators = OperatorCache::default().operators_for(&rules, 4, 0)?;

    // Rule (1,3) then rule (2,3).
    let sequence = MoveSequence::new(vec![2, 3]);
    let expected = start.swapped(1, 3);
    assert_eq!(replay(&start, &sequence, &rules, 0), expected);

    let mut b = LocalBuilder::<f64>::default();
    let regs = prepare::<f64, _>(&mut b, &layout, encode(&start))?;
    let regs = apply_moves::<f64, _>(&mut b, regs, &operators, &layout, true)?;
    let r = regs.merge(&mut b);
    let (state, _) = b.calculate_state()?;
    let probs = measure_probs(b.n(), r.indices(), &state);

    // Every selector branch carries the arrangement its sequence leads to.
    for selector in 0..layout.search_space() {
        let steps = MoveSequence::from_selector(selector, &layout);
        let end = replay(&start, &steps, &rules, 0);
        assert_almost_eq(
            probs[layout.join_sample(encode(&end), selector)],
            1.0 / 16.0,
            10,
        );
    }
    let raw = layout.join_sample(encode(&expected), sequence.to_selector(&layout));
    let (state_index, _) = layout.split_sample(raw);
    assert_eq!(decode(state_index, 4)?, expected);
    assert_almost_eq(probs[raw], 1.0 / 16.0, 10);
    Ok(())
}

#[test]
fn test_ranking_places_dominant_first() -> SearchResult<()> {
    let layout = SearchLayout::new(4, 4, 2)?;
    let mut samples = (0..16)
        .map(|selector| (layout.join_sample(selector, selector), 1 + selector % 5))
        .collect::<Vec<_>>();
    let dominant = layout.join_sample(9, 0b0111);
    samples.insert(7, (dominant, 50));
    let outcomes = decode_samples(&layout, &samples)?;
    assert_eq!(outcomes[0].count, 50);
    assert_eq!(outcomes[0].permutation, decode(9, 4)?);
    assert_eq!(outcomes[0].sequence.steps(), &[3, 1]);
    assert!(outcomes[1..].iter().all(|o| o.count <= 5));
    Ok(())
}

#[test]
fn test_search_finds_single_solution() -> SearchResult<()> {
    common::init_tracing();
    let start = Permutation::new(vec![1, 2, 3, 0])?;
    let goal = Permutation::new(vec![0, 2, 1, 3])?;
    let config = SearchConfig::default().with_seed(1234);
    let mut search = PuzzleSearch::new(RuleSet::two_by_two(), config)?;
    let report = search.run(&start, &goal)?;

    assert_eq!(report.layout.total_qubits(), 9);
    assert_eq!(report.iterations, 3);
    assert_eq!(report.marked_sequences, 1);
    assert!(report.warning.is_none());
    assert_eq!(report.outcomes.iter().map(|o| o.count).sum::<usize>(), 512);

    let best = report.solution().expect("goal should dominate");
    assert_eq!(best.sequence.steps(), &[3, 1]);
    assert_eq!(replay(&start, &best.sequence, search.rules(), 0), goal);
    // Success probability is about 0.96.
    assert!(report.goal_count() > 440);
    Ok(())
}

#[test]
fn test_search_is_reproducible() -> SearchResult<()> {
    let start = Permutation::new(vec![1, 2, 3, 0])?;
    let goal = Permutation::new(vec![1, 2, 0, 3])?;
    let config = SearchConfig::default().with_seed(99).with_shots(128);
    let mut search = PuzzleSearch::new(RuleSet::two_by_two(), config)?;
    let first = search.run(&start, &goal)?;
    let second = search.run(&start, &goal)?;
    assert_eq!(first.outcomes, second.outcomes);
    assert_eq!(
        first.marked_sequences,
        count_marked(&start, &goal, &first.layout, search.rules(), 0)
    );
    Ok(())
}

#[test]
fn test_depth_zero_search() -> SearchResult<()> {
    let start = Permutation::new(vec![1, 2, 3, 0])?;
    let config = SearchConfig::default().with_depth(0).with_seed(5).with_shots(32);
    let mut search = PuzzleSearch::new(RuleSet::two_by_two(), config)?;

    let report = search.run(&start, &start)?;
    assert_eq!(report.layout.search_space(), 1);
    assert_eq!(report.iterations, 1);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].count, 32);
    assert!(report.outcomes[0].sequence.is_empty());
    assert!(report.solution().is_some());

    let other = Permutation::new(vec![1, 2, 0, 3])?;
    let report = search.run(&start, &other)?;
    assert!(matches!(
        report.warning,
        Some(SearchError::UnsatisfiableDepth { depth: 0 })
    ));
    assert!(report.solution().is_none());
    Ok(())
}

#[test]
fn test_line_with_idle_selector_value() -> SearchResult<()> {
    // A 1x4 line has three rules, so selector value 3 is an idle step.
    let rules = RuleSet::grid(1, 4)?;
    let start = Permutation::new(vec![1, 2, 3, 0])?;
    let goal = Permutation::new(vec![1, 0, 2, 3])?;
    let config = SearchConfig::default().with_seed(3).with_shots(256);
    let mut search = PuzzleSearch::new(rules, config)?;
    let report = search.run(&start, &goal)?;
    assert_eq!(report.layout.bits_per_rule, 2);
    assert_eq!(report.layout.search_space(), 16);
    assert_eq!(report.iterations, 3);
    // The blank has to walk left twice, every other choice wastes a step.
    assert_eq!(report.marked_sequences, 1);
    let best = report.solution().expect("goal should dominate");
    assert_eq!(best.sequence.steps(), &[2, 1]);
    assert!(report.goal_count() > 220);
    Ok(())
}

#[test]
fn test_invalid_inputs_fail_before_synthesis() -> SearchResult<()> {
    let mut search = PuzzleSearch::new(RuleSet::two_by_two(), SearchConfig::default())?;
    let start = Permutation::new(vec![1, 2, 3, 0])?;
    let goal = Permutation::new(vec![1, 2, 0])?;
    assert!(matches!(
        search.run(&start, &goal),
        Err(SearchError::InvalidPermutation { .. })
    ));
    let blank_missing = PuzzleSearch::new(
        RuleSet::two_by_two(),
        SearchConfig::default().with_blank(7),
    )?
    .run(&start, &start);
    assert!(matches!(
        blank_missing,
        Err(SearchError::InvalidConfiguration(_))
    ));
    assert_eq!(search.cached_operators(), 0);
    Ok(())
}
