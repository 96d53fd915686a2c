use crate::errors::{SearchError, SearchResult};
use crate::puzzle::codec::{decode, encode, factorial, Permutation};
use crate::utils::qubits_to_cover;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Largest tile count for which rule operators are synthesized. The tables hold
/// `2^ceil(log2(n!))` entries.
pub const MAX_OPERATOR_TILES: usize = 10;

/// Swap the tiles on board positions `a` and `b`, legal only when one of them holds the blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoveRule {
    /// First board position.
    pub a: usize,
    /// Second board position.
    pub b: usize,
}

impl MoveRule {
    /// Make a rule swapping positions `a` and `b`.
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    /// Whether the blank sits on one of the rule's positions.
    pub fn is_legal(&self, p: &Permutation, blank: usize) -> bool {
        p.position(blank)
            .map(|pos| pos == self.a || pos == self.b)
            .unwrap_or(false)
    }

    /// The arrangement after the move, or a copy of `p` if the move is illegal there.
    pub fn apply(&self, p: &Permutation, blank: usize) -> Permutation {
        if self.is_legal(p, blank) {
            p.swapped(self.a, self.b)
        } else {
            p.clone()
        }
    }
}

impl fmt::Display for MoveRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

/// The ordered list of move rules a search chooses from. A rule's position in the list is the
/// value its selector block takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<MoveRule>,
}

impl RuleSet {
    /// Make a rule set. Rules must swap two distinct positions and appear once.
    pub fn new(rules: Vec<MoveRule>) -> SearchResult<Self> {
        if rules.is_empty() {
            return Err(SearchError::InvalidConfiguration(
                "a rule set needs at least one rule".to_string(),
            ));
        }
        if let Some(rule) = rules.iter().find(|r| r.a == r.b) {
            return Err(SearchError::InvalidConfiguration(format!(
                "rule {} swaps a position with itself",
                rule
            )));
        }
        let duplicate = rules.iter().enumerate().find(|(i, r)| {
            rules[..*i]
                .iter()
                .any(|o| (o.a == r.a && o.b == r.b) || (o.a == r.b && o.b == r.a))
        });
        if let Some((_, rule)) = duplicate {
            return Err(SearchError::InvalidConfiguration(format!(
                "rule {} appears more than once",
                rule
            )));
        }
        Ok(Self { rules })
    }

    /// The four swaps of the 2x2 board (the 3-puzzle), positions numbered row by row:
    /// `(0,1), (0,2), (1,3), (2,3)`.
    pub fn two_by_two() -> Self {
        Self {
            rules: vec![
                MoveRule::new(0, 1),
                MoveRule::new(0, 2),
                MoveRule::new(1, 3),
                MoveRule::new(2, 3),
            ],
        }
    }

    /// Every swap between orthogonally adjacent positions of a `rows x cols` board, positions
    /// numbered row by row, sorted.
    /// ```
    /// use qpuzzle::puzzle::RuleSet;
    ///
    /// assert_eq!(RuleSet::grid(2, 2).unwrap(), RuleSet::two_by_two());
    /// assert_eq!(RuleSet::grid(2, 3).unwrap().len(), 7);
    /// ```
    pub fn grid(rows: usize, cols: usize) -> SearchResult<Self> {
        let mut rules = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .flat_map(|(row, col)| {
                let p = row * cols + col;
                let right = (col + 1 < cols).then(|| MoveRule::new(p, p + 1));
                let down = (row + 1 < rows).then(|| MoveRule::new(p, p + cols));
                right.into_iter().chain(down)
            })
            .collect::<Vec<_>>();
        rules.sort();
        Self::new(rules)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Never true for a constructed rule set.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in selector order.
    pub fn rules(&self) -> &[MoveRule] {
        &self.rules
    }

    /// The rule selected by `value`, `None` for an idle selector value.
    pub fn get(&self, value: usize) -> Option<MoveRule> {
        self.rules.get(value).cloned()
    }

    /// Smallest tile count whose board contains every rule position.
    pub fn tiles_required(&self) -> usize {
        self.rules
            .iter()
            .map(|r| r.a.max(r.b) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Width of a selector block, `ceil(log2(len))`.
    pub fn bits_per_rule(&self) -> usize {
        qubits_to_cover(self.rules.len())
    }
}

/// A move rule as a basis permutation of the state register.
///
/// Register value `i < n!` is the Lehmer index of an arrangement. The forward table sends it to
/// the index of the arrangement after the move, or to itself when the move is illegal. Values
/// past `n!` are never populated and are left in place.
#[derive(Debug, Clone)]
pub struct RuleOperator {
    rule: MoveRule,
    tiles: usize,
    blank: usize,
    forward: Arc<[usize]>,
    inverse: Arc<[usize]>,
}

impl RuleOperator {
    /// Build and validate the operator for `rule` on boards of `tiles` tiles with the given blank
    /// label.
    pub fn synthesize(rule: MoveRule, tiles: usize, blank: usize) -> SearchResult<Self> {
        if tiles > MAX_OPERATOR_TILES {
            return Err(SearchError::InvalidConfiguration(format!(
                "rule operators are limited to {} tiles, got {}",
                MAX_OPERATOR_TILES, tiles
            )));
        }
        if rule.a >= tiles || rule.b >= tiles {
            return Err(SearchError::InvalidConfiguration(format!(
                "rule {} does not fit a board of {} tiles",
                rule, tiles
            )));
        }
        if blank >= tiles {
            return Err(SearchError::InvalidConfiguration(format!(
                "blank label {} is not a label of {} tiles",
                blank, tiles
            )));
        }
        let reachable = factorial(tiles).ok_or_else(|| {
            SearchError::InvalidConfiguration(format!("{}! does not fit in usize", tiles))
        })?;
        let dim = 1usize << qubits_to_cover(reachable);

        let mut forward = (0..dim).collect::<Vec<_>>();
        for (i, target) in forward.iter_mut().enumerate().take(reachable) {
            *target = encode(&rule.apply(&decode(i, tiles)?, blank));
        }
        validate_table(rule, &forward, reachable)?;

        let mut inverse = vec![0; dim];
        forward.iter().enumerate().for_each(|(i, j)| inverse[*j] = i);

        let moved = forward.iter().enumerate().filter(|(i, j)| i != *j).count();
        tracing::debug!(%rule, tiles, blank, dim, moved, "synthesized rule operator");
        Ok(Self {
            rule,
            tiles,
            blank,
            forward: Arc::from(forward),
            inverse: Arc::from(inverse),
        })
    }

    /// The rule this operator performs.
    pub fn rule(&self) -> MoveRule {
        self.rule
    }

    /// Number of tiles on the board.
    pub fn tiles(&self) -> usize {
        self.tiles
    }

    /// The blank label.
    pub fn blank(&self) -> usize {
        self.blank
    }

    /// Number of basis states of the state register.
    pub fn dim(&self) -> usize {
        self.forward.len()
    }

    /// State index after the move.
    pub fn target(&self, index: usize) -> Option<usize> {
        self.forward.get(index).cloned()
    }

    /// The forward table for `forward == true`, the inverse table otherwise.
    pub fn table(&self, forward: bool) -> Arc<[usize]> {
        if forward {
            self.forward.clone()
        } else {
            self.inverse.clone()
        }
    }
}

/// Rule operators keyed by `(rule, tiles, blank)`, shared across searches.
#[derive(Debug, Default)]
pub struct OperatorCache {
    operators: HashMap<(MoveRule, usize, usize), Arc<RuleOperator>>,
}

impl OperatorCache {
    /// Fetch the operator, synthesizing it on first use.
    pub fn get_or_synthesize(
        &mut self,
        rule: MoveRule,
        tiles: usize,
        blank: usize,
    ) -> SearchResult<Arc<RuleOperator>> {
        let key = (rule, tiles, blank);
        if let Some(op) = self.operators.get(&key) {
            tracing::trace!(%rule, tiles, blank, "rule operator cache hit");
            return Ok(op.clone());
        }
        let op = Arc::new(RuleOperator::synthesize(rule, tiles, blank)?);
        self.operators.insert(key, op.clone());
        Ok(op)
    }

    /// Operators for every rule of `rules`, in selector order.
    pub fn operators_for(
        &mut self,
        rules: &RuleSet,
        tiles: usize,
        blank: usize,
    ) -> SearchResult<Vec<Arc<RuleOperator>>> {
        rules
            .rules()
            .iter()
            .map(|rule| self.get_or_synthesize(*rule, tiles, blank))
            .collect()
    }

    /// Number of cached operators.
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// True if nothing has been synthesized yet.
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

/// Checks that the first `reachable` entries of `forward` are a self-inverse bijection onto
/// `0..reachable`.
fn validate_table(rule: MoveRule, forward: &[usize], reachable: usize) -> SearchResult<()> {
    let synthesis_error = |reason: String| SearchError::OperatorSynthesis {
        a: rule.a,
        b: rule.b,
        reason,
    };
    if forward.len() < reachable {
        return Err(synthesis_error(format!(
            "table covers {} of {} states",
            forward.len(),
            reachable
        )));
    }

    let mut targeted = vec![false; reachable];
    for (i, j) in forward[..reachable].iter().cloned().enumerate() {
        if j >= reachable {
            return Err(synthesis_error(format!(
                "{} maps outside the reachable states to {}",
                i, j
            )));
        }
        if targeted[j] {
            return Err(synthesis_error(format!(
                "two arrangements map to index {}",
                j
            )));
        }
        targeted[j] = true;
    }
    match (0..reachable).find(|i| forward[forward[*i]] != *i) {
        Some(i) => Err(synthesis_error(format!(
            "applying the move twice sends {} to {}",
            i,
            forward[forward[i]]
        ))),
        None => Ok(()),
    }
}
