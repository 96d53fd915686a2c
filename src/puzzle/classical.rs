use crate::puzzle::codec::Permutation;
use crate::puzzle::decoder::MoveSequence;
use crate::puzzle::layout::SearchLayout;
use crate::puzzle::rules::RuleSet;
use std::collections::{HashMap, VecDeque};

/// Play `sequence` on `start` without a circuit. Illegal moves and idle selector values leave
/// the arrangement unchanged.
/// ```
/// use qpuzzle::puzzle::classical::replay;
/// use qpuzzle::puzzle::{MoveSequence, Permutation, RuleSet};
///
/// let start = Permutation::new(vec![1, 2, 3, 0]).unwrap();
/// let end = replay(&start, &MoveSequence::new(vec![3, 1]), &RuleSet::two_by_two(), 0);
/// assert_eq!(end.tiles(), &[0, 2, 1, 3]);
/// ```
pub fn replay(
    start: &Permutation,
    sequence: &MoveSequence,
    rules: &RuleSet,
    blank: usize,
) -> Permutation {
    sequence
        .rules(rules)
        .fold(start.clone(), |p, rule| match rule {
            Some(rule) => rule.apply(&p, blank),
            None => p,
        })
}

/// Shortest list of arrangements leading from `start` to `goal`, both included, by breadth
/// first search over legal moves. `None` if the goal cannot be reached.
pub fn solve(
    start: &Permutation,
    goal: &Permutation,
    rules: &RuleSet,
    blank: usize,
) -> Option<Vec<Permutation>> {
    if start == goal {
        return Some(vec![start.clone()]);
    }
    let mut parents: HashMap<Permutation, Option<Permutation>> = HashMap::new();
    let mut queue = VecDeque::new();
    parents.insert(start.clone(), None);
    queue.push_back(start.clone());

    while let Some(p) = queue.pop_front() {
        for rule in rules.rules() {
            if !rule.is_legal(&p, blank) {
                continue;
            }
            let next = rule.apply(&p, blank);
            if parents.contains_key(&next) {
                continue;
            }
            parents.insert(next.clone(), Some(p.clone()));
            if &next == goal {
                let mut path = vec![next];
                while let Some(Some(parent)) = path.last().and_then(|last| parents.get(last)) {
                    path.push(parent.clone());
                }
                path.reverse();
                tracing::debug!(moves = path.len() - 1, "classical solution found");
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}

/// Number of selector values whose sequence carries `start` to `goal`. Counts paths step by
/// step instead of enumerating the search space.
pub fn count_marked(
    start: &Permutation,
    goal: &Permutation,
    layout: &SearchLayout,
    rules: &RuleSet,
    blank: usize,
) -> usize {
    let block_values = 1usize << layout.bits_per_rule;
    let mut frontier: HashMap<Permutation, usize> = HashMap::new();
    frontier.insert(start.clone(), 1);
    for _ in 0..layout.depth {
        let mut next: HashMap<Permutation, usize> = HashMap::new();
        for (p, paths) in &frontier {
            for value in 0..block_values {
                let moved = match rules.get(value) {
                    Some(rule) => rule.apply(p, blank),
                    None => p.clone(),
                };
                let entry = next.entry(moved).or_insert(0);
                *entry = entry.saturating_add(*paths);
            }
        }
        frontier = next;
    }
    frontier.get(goal).cloned().unwrap_or(0)
}

#[cfg(test)]
mod classical_tests {
    use super::*;
    use crate::errors::SearchResult;
    use crate::puzzle::rules::MoveRule;

    #[test]
    fn test_replay_illegal_steps() -> SearchResult<()> {
        let start = Permutation::new(vec![1, 2, 3, 0])?;
        let rules = RuleSet::two_by_two();
        let end = replay(&start, &MoveSequence::new(vec![2, 3]), &rules, 0);
        // (1,3) moves the blank to position 1, so (2,3) is illegal.
        assert_eq!(end.tiles(), &[1, 0, 3, 2]);
        Ok(())
    }

    #[test]
    fn test_solve_three_puzzle() -> SearchResult<()> {
        let start = Permutation::new(vec![1, 2, 3, 0])?;
        let goal = Permutation::new(vec![0, 3, 2, 1])?;
        let path = solve(&start, &goal, &RuleSet::two_by_two(), 0).unwrap();
        assert_eq!(path.len(), 7);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        path.windows(2).for_each(|w| {
            let moved = RuleSet::two_by_two()
                .rules()
                .iter()
                .any(|r| r.is_legal(&w[0], 0) && r.apply(&w[0], 0) == w[1]);
            assert!(moved);
        });
        Ok(())
    }

    #[test]
    fn test_solve_unreachable() -> SearchResult<()> {
        // Swapping two non-blank tiles changes the parity reachable on a 2x2 board.
        let start = Permutation::new(vec![2, 1, 3, 0])?;
        let goal = Permutation::new(vec![1, 2, 3, 0])?;
        assert!(solve(&start, &goal, &RuleSet::two_by_two(), 0).is_none());
        Ok(())
    }

    #[test]
    fn test_count_marked() -> SearchResult<()> {
        let start = Permutation::new(vec![1, 2, 3, 0])?;
        let rules = RuleSet::two_by_two();
        let layout = SearchLayout::new(4, rules.len(), 2)?;

        let single = Permutation::new(vec![0, 2, 1, 3])?;
        assert_eq!(count_marked(&start, &single, &layout, &rules, 0), 1);

        // One move away: reached by doing it and idling in either order.
        let near = Permutation::new(vec![1, 2, 0, 3])?;
        assert_eq!(count_marked(&start, &near, &layout, &rules, 0), 4);

        let far = Permutation::new(vec![3, 2, 1, 0])?;
        assert_eq!(count_marked(&start, &far, &layout, &rules, 0), 0);
        Ok(())
    }

    #[test]
    fn test_count_marked_idle_values() -> SearchResult<()> {
        let start = Permutation::new(vec![0, 1, 2])?;
        let rules = RuleSet::new(vec![
            MoveRule::new(0, 1),
            MoveRule::new(1, 2),
            MoveRule::new(0, 2),
        ])?;
        let layout = SearchLayout::new(3, rules.len(), 1)?;
        // Value 3 is idle, and rule (1,2) is illegal with the blank on position 0.
        assert_eq!(count_marked(&start, &start, &layout, &rules, 0), 2);
        Ok(())
    }
}
