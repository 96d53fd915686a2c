use crate::errors::{SearchError, SearchResult};
use crate::puzzle::codec::{factorial, MAX_TILES};
use crate::utils::qubits_to_cover;

/// Qubit layout of a search circuit.
///
/// The state register comes first, followed by one selector block of `bits_per_rule` qubits per
/// step. A sampled value holds the state index in its low `state_qubits` bits and step `s`'s
/// rule in the block starting at bit `state_qubits + s * bits_per_rule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLayout {
    /// Number of tiles.
    pub tiles: usize,
    /// Qubits holding the state index, `ceil(log2(tiles!))`.
    pub state_qubits: usize,
    /// Number of move rules.
    pub num_rules: usize,
    /// Qubits per selector block, `ceil(log2(num_rules))`.
    pub bits_per_rule: usize,
    /// Moves per sequence.
    pub depth: usize,
}

impl SearchLayout {
    /// Lay out a search over `depth` moves chosen from `num_rules` rules on `tiles` tiles.
    /// ```
    /// use qpuzzle::puzzle::SearchLayout;
    ///
    /// let layout = SearchLayout::new(4, 4, 2).unwrap();
    /// assert_eq!(layout.state_qubits, 5);
    /// assert_eq!(layout.selector_qubits(), 4);
    /// assert_eq!(layout.total_qubits(), 9);
    /// assert_eq!(layout.search_space(), 16);
    /// ```
    pub fn new(tiles: usize, num_rules: usize, depth: usize) -> SearchResult<Self> {
        let reachable = factorial(tiles)
            .filter(|_| tiles <= MAX_TILES)
            .ok_or_else(|| {
                SearchError::InvalidConfiguration(format!(
                    "at most {} tiles are supported, got {}",
                    MAX_TILES, tiles
                ))
            })?;
        if num_rules == 0 {
            return Err(SearchError::InvalidConfiguration(
                "a search needs at least one rule".to_string(),
            ));
        }
        let layout = Self {
            tiles,
            state_qubits: qubits_to_cover(reachable),
            num_rules,
            bits_per_rule: qubits_to_cover(num_rules),
            depth,
        };
        let allowed = (usize::BITS - 1) as usize;
        match layout
            .bits_per_rule
            .checked_mul(depth)
            .and_then(|s| s.checked_add(layout.state_qubits))
        {
            Some(total) if total <= allowed => Ok(layout),
            Some(required) => Err(SearchError::CircuitTooLarge { required, allowed }),
            None => Err(SearchError::CircuitTooLarge {
                required: usize::MAX,
                allowed,
            }),
        }
    }

    /// Qubits across all selector blocks.
    pub fn selector_qubits(&self) -> usize {
        self.bits_per_rule * self.depth
    }

    /// Qubits in the whole circuit.
    pub fn total_qubits(&self) -> usize {
        self.state_qubits + self.selector_qubits()
    }

    /// Number of encodable move sequences, `2^selector_qubits`. Equal to `num_rules^depth` when
    /// the rule count is a power of two, otherwise some block values are idle steps.
    pub fn search_space(&self) -> usize {
        1 << self.selector_qubits()
    }

    /// Number of valid arrangements, `tiles!`.
    pub fn reachable_states(&self) -> usize {
        factorial(self.tiles).unwrap_or(usize::MAX)
    }

    /// Split a sampled value into `(state index, selector)`.
    pub fn split_sample(&self, value: usize) -> (usize, usize) {
        let state_mask = (1 << self.state_qubits) - 1;
        (value & state_mask, value >> self.state_qubits)
    }

    /// The sampled value holding `state_index` and `selector`, inverse of `split_sample`.
    pub fn join_sample(&self, state_index: usize, selector: usize) -> usize {
        state_index | (selector << self.state_qubits)
    }

    /// The rule value chosen at `step` by `selector`. Always zero with a single rule.
    pub fn rule_at(&self, selector: usize, step: usize) -> usize {
        let mask = (1 << self.bits_per_rule) - 1;
        (selector >> (step * self.bits_per_rule)) & mask
    }

    /// The selector choosing `steps[s]` at every step `s`.
    pub fn selector_for(&self, steps: &[usize]) -> usize {
        steps
            .iter()
            .enumerate()
            .fold(0, |acc, (s, v)| acc | (v << (s * self.bits_per_rule)))
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;

    #[test]
    fn test_depth_zero() -> SearchResult<()> {
        let layout = SearchLayout::new(4, 4, 0)?;
        assert_eq!(layout.selector_qubits(), 0);
        assert_eq!(layout.search_space(), 1);
        assert_eq!(layout.total_qubits(), 5);
        Ok(())
    }

    #[test]
    fn test_single_rule() -> SearchResult<()> {
        let layout = SearchLayout::new(3, 1, 3)?;
        assert_eq!(layout.bits_per_rule, 0);
        assert_eq!(layout.search_space(), 1);
        assert_eq!(layout.rule_at(0, 2), 0);
        Ok(())
    }

    #[test]
    fn test_non_power_of_two_rules() -> SearchResult<()> {
        let layout = SearchLayout::new(6, 7, 2)?;
        assert_eq!(layout.state_qubits, 10);
        assert_eq!(layout.bits_per_rule, 3);
        assert_eq!(layout.search_space(), 64);
        Ok(())
    }

    #[test]
    fn test_sample_split() -> SearchResult<()> {
        let layout = SearchLayout::new(4, 4, 2)?;
        let selector = layout.selector_for(&[3, 1]);
        assert_eq!(selector, 0b0111);
        assert_eq!(layout.rule_at(selector, 0), 3);
        assert_eq!(layout.rule_at(selector, 1), 1);
        let value = layout.join_sample(9, selector);
        assert_eq!(value, 9 | (0b0111 << 5));
        assert_eq!(layout.split_sample(value), (9, selector));
        Ok(())
    }

    #[test]
    fn test_too_large() {
        assert!(matches!(
            SearchLayout::new(4, 4, 100),
            Err(SearchError::CircuitTooLarge { .. })
        ));
        assert!(SearchLayout::new(21, 4, 1).is_err());
        assert!(SearchLayout::new(4, 0, 1).is_err());
    }
}
