/// Set the `bit_index` bit in `num` to `value`.
///
/// # Example
/// ```
/// use qpuzzle::utils::set_bit;
/// assert_eq!(set_bit(0, 1, true), 2);
/// assert_eq!(set_bit(1, 1, true), 3);
/// assert_eq!(set_bit(1, 0, false), 0);
/// ```
#[inline]
pub fn set_bit(num: usize, bit_index: usize, value: bool) -> usize {
    let v = 1 << bit_index;
    if value {
        num | v
    } else {
        num & !v
    }
}

/// Get the `bit_index` bit value from `num`.
///
/// # Example
/// ```
/// use qpuzzle::utils::get_bit;
/// let n = get_bit(2, 1);
/// assert_eq!(n, true);
/// ```
#[inline]
pub fn get_bit(num: usize, bit_index: usize) -> bool {
    ((num >> bit_index) & 1) != 0
}

/// Get the index into an Op matrix
#[inline]
pub fn get_flat_index(nindices: usize, i: usize, j: usize) -> usize {
    let mat_side = 1 << nindices;
    (i * mat_side) + j
}

/// Get the index for a submatrix indexed by `indices` given the `full_index` for the larger
/// 2^n by 2^n matrix. The first of `mat_indices` is the most significant bit of the result.
pub fn full_to_sub(n: usize, mat_indices: &[usize], full_index: usize) -> usize {
    let nindices = mat_indices.len();
    mat_indices
        .iter()
        .enumerate()
        .fold(0, |acc, (j, indx)| -> usize {
            let bit = get_bit(full_index, n - 1 - *indx);
            set_bit(acc, nindices - 1 - j, bit)
        })
}

/// Given the `sub_index` for the submatrix, and a base to overwrite values, get the full index
/// for the 2^n by 2^n matrix.
pub fn sub_to_full(n: usize, mat_indices: &[usize], sub_index: usize, base: usize) -> usize {
    let nindices = mat_indices.len();
    mat_indices.iter().enumerate().fold(base, |acc, (j, indx)| {
        let bit = get_bit(sub_index, nindices - 1 - j);
        set_bit(acc, n - 1 - *indx, bit)
    })
}

/// Read the value held by the qubits at `indices` in the basis state `full_index` of an `n`
/// qubit circuit. The `k`th entry of `indices` is bit `k` of the value.
///
/// # Example
/// ```
/// use qpuzzle::utils::register_value;
///
/// // |q0 q1 q2> = |110>
/// assert_eq!(register_value(3, &[0, 1], 0b110), 0b11);
/// assert_eq!(register_value(3, &[1, 2], 0b110), 0b01);
/// ```
#[inline]
pub fn register_value(n: usize, indices: &[usize], full_index: usize) -> usize {
    indices.iter().enumerate().fold(0, |acc, (k, index)| {
        let bit = (full_index >> (n - 1 - index)) & 1;
        acc | (bit << k)
    })
}

/// Overwrite the qubits at `indices` in the basis state `full_index` with `value`, the inverse of
/// [`register_value`].
///
/// # Example
/// ```
/// use qpuzzle::utils::{register_value, with_register_value};
///
/// let full = with_register_value(3, &[1, 2], 0b10, 0b111);
/// assert_eq!(full, 0b101);
/// assert_eq!(register_value(3, &[1, 2], full), 0b10);
/// ```
#[inline]
pub fn with_register_value(n: usize, indices: &[usize], value: usize, full_index: usize) -> usize {
    indices
        .iter()
        .enumerate()
        .fold(full_index, |acc, (k, index)| {
            set_bit(acc, n - 1 - index, get_bit(value, k))
        })
}

/// Number of qubits needed to give `m` distinct basis states, `ceil(log2(m))`.
///
/// # Example
/// ```
/// use qpuzzle::utils::qubits_to_cover;
///
/// assert_eq!(qubits_to_cover(1), 0);
/// assert_eq!(qubits_to_cover(4), 2);
/// assert_eq!(qubits_to_cover(24), 5);
/// ```
pub fn qubits_to_cover(m: usize) -> usize {
    if m <= 1 {
        0
    } else {
        (usize::BITS - (m - 1).leading_zeros()) as usize
    }
}
