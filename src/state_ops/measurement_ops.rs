#[cfg(feature = "parallel")]
pub(crate) use rayon::prelude::*;

use crate::utils::register_value;
use crate::{into_iter, iter, iter_mut};
use crate::{Complex, Precision};
use num_traits::Zero;
use rand::Rng;
use std::collections::HashMap;

/// Get total magnitude of state.
pub fn prob_magnitude<P: Precision>(input: &[Complex<P>]) -> P {
    iter!(input).map(Complex::<P>::norm_sqr).sum()
}

/// Calculate the probability of a given measurement. `measured` gives the bits (as a usize) which
/// has been measured from the qubits at `indices` in the order supplied by `indices`. `input`
/// gives the state from which to measure, representing a total of `n` qubits.
///
/// Keep in mind that qubits are big-endian to match kron product standards.
/// `|abc>` means `q0=a`, `q1=b`, `q2=c`
///
/// # Examples
/// ```
/// use qpuzzle::state_ops::matrix_ops::from_reals;
/// use qpuzzle::state_ops::measurement_ops::measure_prob;
///
/// // Make the state |10>, index 0 is always |1> and index 1 is always |0>
/// let input = from_reals(&[0.0, 0.0, 1.0, 0.0]);
///
/// let p = measure_prob(2, 0, &[0], &input);
/// assert_eq!(p, 0.0);
///
/// let p = measure_prob(2, 1, &[0], &input);
/// assert_eq!(p, 1.0);
///
/// let p = measure_prob(2, 1, &[0, 1], &input);
/// assert_eq!(p, 1.0);
///
/// let p = measure_prob(2, 2, &[1, 0], &input);
/// assert_eq!(p, 1.0);
/// ```
pub fn measure_prob<P: Precision>(
    n: usize,
    measured: usize,
    indices: &[usize],
    input: &[Complex<P>],
) -> P {
    let r = 0usize..input.len();
    into_iter!(r)
        .filter(|row| register_value(n, indices, *row) == measured)
        .map(|row| input[row].norm_sqr())
        .sum()
}

/// Get probability for each possible measurement of `indices` on `input`.
pub fn measure_probs<P: Precision>(n: usize, indices: &[usize], input: &[Complex<P>]) -> Vec<P> {
    let mut probs = vec![P::zero(); 1 << indices.len()];
    input.iter().enumerate().for_each(|(row, amp)| {
        probs[register_value(n, indices, row)] += amp.norm_sqr();
    });
    probs
}

/// Sample a measurement from a state `input`.
/// Sample from qubits at `indices` and return bits in order given by `indices`. See
/// `measure_prob` for details.
///
/// # Examples
/// ```
/// use qpuzzle::state_ops::matrix_ops::from_reals;
/// use qpuzzle::state_ops::measurement_ops::soft_measure;
///
/// // Make the state |10>, index 0 is always |1> and index 1 is always |0>
/// let input = from_reals(&[0.0, 0.0, 1.0, 0.0]);
/// let mut rng = qpuzzle::rand::thread_rng();
///
/// let m = soft_measure(2, &[0], &input, &mut rng);
/// assert_eq!(m, 1);
/// let m = soft_measure(2, &[1], &input, &mut rng);
/// assert_eq!(m, 0);
/// let m = soft_measure(2, &[0, 1], &input, &mut rng);
/// assert_eq!(m, 0b01);
/// let m = soft_measure(2, &[1, 0], &input, &mut rng);
/// assert_eq!(m, 0b10);
/// ```
pub fn soft_measure<P: Precision, R: Rng + ?Sized>(
    n: usize,
    indices: &[usize],
    input: &[Complex<P>],
    rng: &mut R,
) -> usize {
    let mut r = P::from(rng.gen::<f64>()).unwrap_or_else(P::zero) * prob_magnitude(input);
    let mut measured_indx = 0;
    for (i, c) in input.iter().enumerate() {
        if c.is_zero() {
            continue;
        }
        measured_indx = i;
        r -= c.norm_sqr();
        if r <= P::zero() {
            break;
        }
    }
    register_value(n, indices, measured_indx)
}

/// Selects a measured state from `input`, then calls `measure_state` to manipulate the output.
/// Returns the measured state and probability.
pub fn measure<P: Precision, R: Rng + ?Sized>(
    n: usize,
    indices: &[usize],
    input: &[Complex<P>],
    output: &mut [Complex<P>],
    rng: &mut R,
) -> (usize, P) {
    let m = soft_measure(n, indices, input, rng);
    let p = measure_prob(n, m, indices, input);
    let measured = (m, p);

    measure_state(n, indices, measured, input, output);
    measured
}

/// Normalize the output state such that it matches only states which produce the `measured`
/// result and has the same magnitude.
/// This is done by zeroing out the states which cannot give `measured`, and dividing the remaining
/// by the `sqrt(1/p)` for p=`measured_prob`. See `measure_prob` for details.
pub fn measure_state<P: Precision>(
    n: usize,
    indices: &[usize],
    measured: (usize, P),
    input: &[Complex<P>],
    output: &mut [Complex<P>],
) {
    let (measured, measured_prob) = measured;
    if !measured_prob.is_zero() {
        let p_mult = P::one() / measured_prob.sqrt();

        let f = |(row, (input, output)): (usize, (&Complex<P>, &mut Complex<P>))| {
            if register_value(n, indices, row) != measured {
                // This is not a valid measurement, zero out the entry.
                *output = Complex::default();
            } else {
                // Scale the entry.
                *output = (*input) * p_mult;
            }
        };

        let input_iter = iter!(input);
        let output_iter = iter_mut!(output);
        input_iter.zip(output_iter).enumerate().for_each(f);
    }
}

/// Draw `shots` independent measurements of the qubits at `indices` without collapsing `input`.
/// Returns each observed value with the number of times it was seen, in the order values were
/// first observed.
pub fn sample_counts<P: Precision, R: Rng + ?Sized>(
    n: usize,
    indices: &[usize],
    input: &[Complex<P>],
    shots: usize,
    rng: &mut R,
) -> Vec<(usize, usize)> {
    let probs = measure_probs(n, indices, input);
    let cumulative = probs
        .iter()
        .scan(P::zero(), |acc, p| {
            *acc += *p;
            Some(*acc)
        })
        .collect::<Vec<_>>();
    let total = cumulative.last().cloned().unwrap_or_else(P::zero);
    let last_possible = probs.iter().rposition(|p| !p.is_zero()).unwrap_or(0);

    let mut counts: Vec<(usize, usize)> = vec![];
    let mut positions: HashMap<usize, usize> = HashMap::new();
    (0..shots).for_each(|_| {
        let r = P::from(rng.gen::<f64>()).unwrap_or_else(P::zero) * total;
        let value = cumulative
            .partition_point(|c| *c <= r)
            .min(last_possible);
        match positions.get(&value) {
            Some(pos) => counts[*pos].1 += 1,
            None => {
                positions.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    });
    counts
}

#[cfg(test)]
mod measurement_tests {
    use super::*;
    use crate::state_ops::matrix_ops::from_reals;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn round(c: Complex<f64>) -> Complex<f64> {
        Complex {
            re: c.re.round(),
            im: c.im.round(),
        }
    }

    fn approx_eq(a: &[Complex<f64>], b: &[Complex<f64>], prec: i32) {
        let prec = 10.0f64.powi(-prec);
        let a: Vec<Complex<f64>> = a.iter().map(|f| round(f * prec) / prec).collect();
        let b: Vec<Complex<f64>> = b.iter().map(|f| round(f * prec) / prec).collect();
        assert_eq!(a, b)
    }

    #[test]
    fn test_measure_state() {
        let n = 2;
        let m = 0;
        let input = from_reals(&[0.5, 0.5, 0.5, 0.5]);
        let p = measure_prob(n, m, &[0], &input);
        assert!((p - 0.5f64).abs() < f64::EPSILON);

        let mut output = input.clone();
        measure_state(n, &[0], (m, p), &input, &mut output);

        let half: f64 = 1.0 / 2.0;
        approx_eq(
            &output,
            &from_reals(&[half.sqrt(), half.sqrt(), 0.0, 0.0]),
            10,
        );
    }

    #[test]
    fn test_measure_state2() {
        let n = 2;
        let m = 1;
        let input = from_reals(&[0.5, 0.5, 0.5, 0.5]);
        let p = measure_prob(n, m, &[0], &input);
        assert!((p - 0.5f64).abs() < f64::EPSILON);

        let mut output = input.clone();
        measure_state(n, &[0], (m, p), &input, &mut output);

        let half: f64 = 1.0 / 2.0;
        approx_eq(
            &output,
            &from_reals(&[0.0, 0.0, half.sqrt(), half.sqrt()]),
            10,
        );
    }

    #[test]
    fn test_measure_probs() {
        let n = 2;
        let input = from_reals(&[0.5, 0.5, 0.5, 0.5]);
        let p = measure_probs(n, &[1], &input);
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn test_sample_counts_deterministic_state() {
        let mut rng = StdRng::seed_from_u64(7);
        let input = from_reals(&[0.0, 0.0, 0.0, 1.0]);
        let counts = sample_counts(2, &[0, 1], &input, 100, &mut rng);
        assert_eq!(counts, vec![(0b11, 100)]);
    }

    #[test]
    fn test_sample_counts_total_and_support() {
        let mut rng = StdRng::seed_from_u64(11);
        let h = 0.5f64.sqrt();
        // Only |00> and |11> carry amplitude.
        let input = from_reals(&[h, 0.0, 0.0, h]);
        let counts = sample_counts(2, &[0, 1], &input, 1000, &mut rng);
        let total: usize = counts.iter().map(|(_, c)| c).sum();
        assert_eq!(total, 1000);
        assert!(counts.iter().all(|(v, _)| *v == 0 || *v == 0b11));
        assert_eq!(counts.len(), 2);
    }
}
