use crate::builder::LocalBuilder;
use crate::builder_traits::{CircuitBuilder, CliffordBuilder, MeasurementBuilder};
use crate::errors::{CircuitError, SearchError, SearchResult};
use crate::puzzle::classical::solve;
use crate::puzzle::codec::{decode, factorial, Permutation};
use crate::puzzle::rules::RuleSet;
use crate::utils::qubits_to_cover;
use rand::Rng;

/// Largest register used to draw a random number.
pub const MAX_RANDOM_QUBITS: usize = 24;

/// Draws before giving up on finding a solvable arrangement.
pub const MAX_START_DRAWS: usize = 1024;

/// A random integer in `[0, m)` measured from a register of `ceil(log2(m))` qubits in uniform
/// superposition, reduced modulo `m`.
/// ```
/// use qpuzzle::puzzle::random::qrng_int;
/// use qpuzzle::rand::thread_rng;
///
/// let x = qrng_int(24, &mut thread_rng()).unwrap();
/// assert!(x < 24);
/// ```
pub fn qrng_int<R: Rng + ?Sized>(m: usize, rng: &mut R) -> SearchResult<usize> {
    if m == 0 {
        return Err(SearchError::InvalidConfiguration(
            "cannot draw from an empty range".to_string(),
        ));
    }
    let n = qubits_to_cover(m);
    if n > MAX_RANDOM_QUBITS {
        return Err(SearchError::CircuitTooLarge {
            required: n,
            allowed: MAX_RANDOM_QUBITS,
        });
    }
    let mut b = LocalBuilder::<f64>::default();
    let r = match b.qudit(n) {
        Some(r) => r,
        None => return Ok(0),
    };
    let r = b.h(r)?;
    let (_, handle) = b.measure(r);
    let (_, measured) = b.calculate_state_with_rng(None, rng)?;
    let (value, _) = measured
        .get_measurement(handle)
        .ok_or_else(|| CircuitError::new("Measurement returned no value"))?;
    Ok(value % m)
}

/// A random arrangement of `goal.len()` tiles from which `goal` can be reached with `rules`.
pub fn random_start<R: Rng + ?Sized>(
    goal: &Permutation,
    rules: &RuleSet,
    blank: usize,
    rng: &mut R,
) -> SearchResult<Permutation> {
    let n = goal.len();
    let bound = factorial(n).ok_or_else(|| {
        SearchError::InvalidConfiguration(format!("{}! does not fit in usize", n))
    })?;
    for draw in 0..MAX_START_DRAWS {
        let candidate = decode(qrng_int(bound, rng)?, n)?;
        if solve(&candidate, goal, rules, blank).is_some() {
            tracing::debug!(draw, start = %candidate, "random solvable start");
            return Ok(candidate);
        }
    }
    Err(SearchError::InvalidConfiguration(format!(
        "no arrangement reaching {} found in {} draws",
        goal, MAX_START_DRAWS
    )))
}

#[cfg(test)]
mod random_tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_qrng_range() -> SearchResult<()> {
        let mut rng = StdRng::seed_from_u64(17);
        for m in [1, 2, 3, 24, 100] {
            for _ in 0..20 {
                assert!(qrng_int(m, &mut rng)? < m);
            }
        }
        assert!(qrng_int(0, &mut rng).is_err());
        Ok(())
    }

    #[test]
    fn test_qrng_seeded_draws_repeat() -> SearchResult<()> {
        let draws = |seed| -> SearchResult<Vec<usize>> {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..16).map(|_| qrng_int(720, &mut rng)).collect()
        };
        let first = draws(31)?;
        assert_eq!(first, draws(31)?);
        assert!(first.iter().all(|x| *x < 720));
        Ok(())
    }

    #[test]
    fn test_qrng_covers_values() -> SearchResult<()> {
        let mut rng = StdRng::seed_from_u64(4);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[qrng_int(4, &mut rng)?] = true;
        }
        assert!(seen.iter().all(|s| *s));
        Ok(())
    }

    #[test]
    fn test_random_start_solvable() -> SearchResult<()> {
        let mut rng = StdRng::seed_from_u64(9);
        let goal = Permutation::new(vec![1, 2, 3, 0])?;
        let rules = RuleSet::two_by_two();
        for _ in 0..5 {
            let start = random_start(&goal, &rules, 0, &mut rng)?;
            assert!(solve(&start, &goal, &rules, 0).is_some());
        }
        Ok(())
    }
}
