use crate::builder::LocalBuilder;
use crate::builder_traits::{CircuitBuilder, MeasurementBuilder};
use crate::errors::{CircuitError, SearchError, SearchResult};
use crate::puzzle::amplification::{amplify, optimal_iterations};
use crate::puzzle::circuit::prepare;
use crate::puzzle::classical::count_marked;
use crate::puzzle::codec::{encode, Permutation};
use crate::puzzle::config::SearchConfig;
use crate::puzzle::decoder::{decode_samples, SampleOutcome};
use crate::puzzle::layout::SearchLayout;
use crate::puzzle::rules::{OperatorCache, RuleSet};

/// Runs amplitude amplification searches for one rule set, reusing the synthesized rule
/// operators between runs.
#[derive(Debug)]
pub struct PuzzleSearch {
    rules: RuleSet,
    config: SearchConfig,
    cache: OperatorCache,
}

/// The result of a search.
#[derive(Debug)]
pub struct SearchReport {
    /// Layout of the simulated circuit.
    pub layout: SearchLayout,
    /// Oracle and diffusion rounds applied.
    pub iterations: usize,
    /// Selector values whose sequence reaches the goal, counted classically.
    pub marked_sequences: usize,
    /// Samples drawn.
    pub shots: usize,
    /// The goal searched for.
    pub goal: Permutation,
    /// Decoded outcomes, most frequent first.
    pub outcomes: Vec<SampleOutcome>,
    /// Set to [`SearchError::UnsatisfiableDepth`] when no sequence reaches the goal, the
    /// outcomes are still reported.
    pub warning: Option<SearchError>,
}

impl SearchReport {
    /// The most frequent outcome if its arrangement is the goal.
    pub fn solution(&self) -> Option<&SampleOutcome> {
        self.outcomes
            .first()
            .filter(|outcome| outcome.permutation == self.goal)
    }

    /// Samples whose arrangement is the goal.
    pub fn goal_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.permutation == self.goal)
            .map(|outcome| outcome.count)
            .sum()
    }
}

impl PuzzleSearch {
    /// Make a search over `rules`.
    pub fn new(rules: RuleSet, config: SearchConfig) -> SearchResult<Self> {
        config.validate()?;
        Ok(Self {
            rules,
            config,
            cache: OperatorCache::default(),
        })
    }

    /// The rules moves are chosen from.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The search settings.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Number of rule operators synthesized so far.
    pub fn cached_operators(&self) -> usize {
        self.cache.len()
    }

    /// Validate `start` and `goal` against the rules and configuration and lay out the circuit.
    pub fn layout_for(&self, start: &Permutation, goal: &Permutation) -> SearchResult<SearchLayout> {
        let n = start.len();
        if goal.len() != n {
            return Err(SearchError::InvalidPermutation {
                tiles: goal.tiles().to_vec(),
                reason: format!("goal has {} tiles but start has {}", goal.len(), n),
            });
        }
        if n < 2 {
            return Err(SearchError::InvalidPermutation {
                tiles: start.tiles().to_vec(),
                reason: "a puzzle needs at least two tiles".to_string(),
            });
        }
        if self.config.blank >= n {
            return Err(SearchError::InvalidConfiguration(format!(
                "blank label {} is not a label of {} tiles",
                self.config.blank, n
            )));
        }
        if self.rules.tiles_required() > n {
            return Err(SearchError::InvalidConfiguration(format!(
                "rules address {} positions but the puzzle has {} tiles",
                self.rules.tiles_required(),
                n
            )));
        }
        let layout = SearchLayout::new(n, self.rules.len(), self.config.depth)?;
        if layout.total_qubits() > self.config.max_qubits {
            return Err(SearchError::CircuitTooLarge {
                required: layout.total_qubits(),
                allowed: self.config.max_qubits,
            });
        }
        Ok(layout)
    }

    /// Search for move sequences carrying `start` to `goal`.
    ///
    /// Validation happens before any operator is synthesized. When no sequence of the configured
    /// depth reaches the goal the search still runs, and the report carries a warning.
    #[tracing::instrument(
        level = "debug",
        skip(self, start, goal),
        fields(start = %start, goal = %goal, depth = self.config.depth)
    )]
    pub fn run(&mut self, start: &Permutation, goal: &Permutation) -> SearchResult<SearchReport> {
        let layout = self.layout_for(start, goal)?;
        tracing::debug!(
            state_qubits = layout.state_qubits,
            selector_qubits = layout.selector_qubits(),
            search_space = layout.search_space(),
            "search layout"
        );

        let blank = self.config.blank;
        let operators = self.cache.operators_for(&self.rules, layout.tiles, blank)?;

        let marked_sequences = count_marked(start, goal, &layout, &self.rules, blank);
        let warning = if marked_sequences == 0 {
            tracing::warn!(depth = layout.depth, "no move sequence reaches the goal");
            Some(SearchError::UnsatisfiableDepth {
                depth: layout.depth,
            })
        } else {
            None
        };
        let iterations = optimal_iterations(layout.search_space(), 1);
        tracing::debug!(iterations, marked_sequences, "amplification rounds");

        let mut b = LocalBuilder::<f64>::default();
        let regs = prepare::<f64, _>(&mut b, &layout, encode(start))?;
        let regs = amplify::<f64, _>(
            &mut b,
            regs,
            &operators,
            &layout,
            encode(goal),
            iterations,
        )?;
        let r = regs.merge(&mut b);
        let (_, handle) = b.measure(r);
        tracing::trace!(qubits = b.n(), depth = b.pipeline_depth(), "search circuit built");

        let mut rng = self.config.rng();
        let (_, measured) = b.sample_with_init(None, self.config.shots, &mut rng)?;
        let samples = measured
            .get_counts(handle)
            .ok_or_else(|| CircuitError::new("Search measurement was not sampled"))?;
        let outcomes = decode_samples(&layout, samples)?;

        if let Some(best) = outcomes.first() {
            tracing::info!(
                permutation = %best.permutation,
                sequence = %best.sequence,
                count = best.count,
                shots = self.config.shots,
                "dominant outcome"
            );
        }
        Ok(SearchReport {
            layout,
            iterations,
            marked_sequences,
            shots: self.config.shots,
            goal: goal.clone(),
            outcomes,
            warning,
        })
    }
}
