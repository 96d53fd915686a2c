use crate::errors::SearchResult;
use crate::puzzle::codec::{decode, Permutation};
use crate::puzzle::layout::SearchLayout;
use crate::puzzle::rules::{MoveRule, RuleSet};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// The rule value chosen at each step of a search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MoveSequence {
    steps: SmallVec<[usize; 8]>,
}

impl MoveSequence {
    /// A sequence of rule values, one per step.
    pub fn new(steps: Vec<usize>) -> Self {
        Self {
            steps: SmallVec::from_vec(steps),
        }
    }

    /// Read the per-step rule values out of a selector.
    pub fn from_selector(selector: usize, layout: &SearchLayout) -> Self {
        Self {
            steps: (0..layout.depth)
                .map(|s| layout.rule_at(selector, s))
                .collect(),
        }
    }

    /// The selector holding this sequence.
    pub fn to_selector(&self, layout: &SearchLayout) -> usize {
        layout.selector_for(&self.steps)
    }

    /// Rule values in step order.
    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True for a depth zero sequence.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The rule chosen at each step, `None` for idle selector values.
    pub fn rules<'a>(&'a self, rules: &'a RuleSet) -> impl Iterator<Item = Option<MoveRule>> + 'a {
        self.steps.iter().map(move |v| rules.get(*v))
    }
}

impl fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps = self
            .steps
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        write!(f, "[{}]", steps.join(", "))
    }
}

/// A decoded `(arrangement, move sequence)` pair with the number of times it was sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleOutcome {
    /// Arrangement held by the state register.
    pub permutation: Permutation,
    /// Move sequence held by the selector.
    pub sequence: MoveSequence,
    /// Times observed, at least one.
    pub count: usize,
}

/// Decode sampled `(value, count)` pairs into outcomes, merging equal pairs and ranking by
/// descending count. Outcomes with equal counts keep the order they were first seen in.
///
/// ```
/// use qpuzzle::puzzle::decoder::decode_samples;
/// use qpuzzle::puzzle::SearchLayout;
///
/// let layout = SearchLayout::new(4, 4, 2).unwrap();
/// let samples = [(layout.join_sample(9, 0b0111), 3), (layout.join_sample(2, 0), 5)];
/// let outcomes = decode_samples(&layout, &samples).unwrap();
/// assert_eq!(outcomes[0].count, 5);
/// assert_eq!(outcomes[1].sequence.steps(), &[3, 1]);
/// ```
pub fn decode_samples(
    layout: &SearchLayout,
    samples: &[(usize, usize)],
) -> SearchResult<Vec<SampleOutcome>> {
    let mut positions: HashMap<(usize, usize), usize> = HashMap::new();
    let mut totals: Vec<((usize, usize), usize)> = vec![];
    samples
        .iter()
        .filter(|(_, count)| *count > 0)
        .for_each(|(value, count)| {
            let key = layout.split_sample(*value);
            match positions.get(&key) {
                Some(pos) => totals[*pos].1 += count,
                None => {
                    positions.insert(key, totals.len());
                    totals.push((key, *count));
                }
            }
        });
    // Stable, so ties stay in encounter order.
    totals.sort_by(|a, b| b.1.cmp(&a.1));

    totals
        .into_iter()
        .map(|((state_index, selector), count)| {
            Ok(SampleOutcome {
                permutation: decode(state_index, layout.tiles)?,
                sequence: MoveSequence::from_selector(selector, layout),
                count,
            })
        })
        .collect()
}

#[cfg(test)]
mod decoder_tests {
    use super::*;
    use crate::errors::SearchError;
    use crate::puzzle::codec::encode;

    #[test]
    fn test_round_trip() -> SearchResult<()> {
        let layout = SearchLayout::new(4, 4, 2)?;
        let goal = Permutation::new(vec![1, 2, 0, 3])?;
        let sequence = MoveSequence::new(vec![2, 1]);
        let value = layout.join_sample(encode(&goal), sequence.to_selector(&layout));
        let outcomes = decode_samples(&layout, &[(value, 1)])?;
        assert_eq!(
            outcomes,
            vec![SampleOutcome {
                permutation: goal,
                sequence,
                count: 1
            }]
        );
        Ok(())
    }

    #[test]
    fn test_merges_and_ties() -> SearchResult<()> {
        let layout = SearchLayout::new(3, 2, 1)?;
        let samples = [
            (layout.join_sample(1, 0), 2),
            (layout.join_sample(4, 1), 2),
            (layout.join_sample(1, 0), 1),
            (layout.join_sample(5, 1), 0),
        ];
        let outcomes = decode_samples(&layout, &samples)?;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].count, 3);
        assert_eq!(outcomes[1].permutation, decode(4, 3)?);
        Ok(())
    }

    #[test]
    fn test_unreachable_state_is_error() -> SearchResult<()> {
        let layout = SearchLayout::new(3, 2, 1)?;
        let result = decode_samples(&layout, &[(layout.join_sample(7, 0), 1)]);
        assert!(matches!(result, Err(SearchError::OutOfRange { index: 7, .. })));
        Ok(())
    }

    #[test]
    fn test_display_and_rules() {
        let rules = RuleSet::new(vec![MoveRule::new(0, 1), MoveRule::new(1, 2), MoveRule::new(0, 2)])
            .unwrap();
        let sequence = MoveSequence::new(vec![2, 3]);
        assert_eq!(sequence.to_string(), "[2, 3]");
        let resolved = sequence.rules(&rules).collect::<Vec<_>>();
        assert_eq!(resolved, vec![Some(MoveRule::new(0, 2)), None]);
    }
}
