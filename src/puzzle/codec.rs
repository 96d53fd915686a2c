use crate::errors::{SearchError, SearchResult};
use smallvec::SmallVec;
use std::fmt;

/// Largest tile count whose permutations can be indexed by a `usize`, `20! < 2^64`.
pub const MAX_TILES: usize = 20;

/// An arrangement of the tile labels `0..n`, one puzzle configuration.
///
/// The label at `tiles()[i]` sits on board position `i`. Permutations are validated on
/// construction and never change afterwards, moves produce new values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permutation {
    tiles: SmallVec<[usize; 8]>,
}

impl Permutation {
    /// Make a permutation, every label in `0..tiles.len()` must appear exactly once.
    /// ```
    /// use qpuzzle::puzzle::Permutation;
    ///
    /// assert!(Permutation::new(vec![1, 2, 3, 0]).is_ok());
    /// assert!(Permutation::new(vec![1, 2, 2, 0]).is_err());
    /// assert!(Permutation::new(vec![1, 2, 4, 0]).is_err());
    /// ```
    pub fn new(tiles: Vec<usize>) -> SearchResult<Self> {
        let n = tiles.len();
        if n > MAX_TILES {
            return Err(SearchError::InvalidPermutation {
                reason: format!("at most {} tiles are supported", MAX_TILES),
                tiles,
            });
        }
        let mut seen = [false; MAX_TILES];
        let problem = tiles.iter().find_map(|label| {
            if *label >= n {
                Some(format!("label {} is not below the tile count {}", label, n))
            } else if seen[*label] {
                Some(format!("label {} appears more than once", label))
            } else {
                seen[*label] = true;
                None
            }
        });
        match problem {
            Some(reason) => Err(SearchError::InvalidPermutation { tiles, reason }),
            None => Ok(Self {
                tiles: SmallVec::from_vec(tiles),
            }),
        }
    }

    /// The arrangement `0, 1, ..., n-1`.
    pub fn identity(n: usize) -> SearchResult<Self> {
        Self::new((0..n).collect::<Vec<_>>())
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True for the empty arrangement.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Labels by board position.
    pub fn tiles(&self) -> &[usize] {
        &self.tiles
    }

    /// Board position holding `label`.
    pub fn position(&self, label: usize) -> Option<usize> {
        self.tiles.iter().position(|t| *t == label)
    }

    /// A copy with the tiles at positions `a` and `b` exchanged.
    pub fn swapped(&self, a: usize, b: usize) -> Self {
        let mut tiles = self.tiles.clone();
        tiles.swap(a, b);
        Self { tiles }
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = self
            .tiles
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>();
        write!(f, "({})", labels.join(", "))
    }
}

/// `n!`, or `None` if it does not fit in a `usize`.
/// ```
/// use qpuzzle::puzzle::codec::factorial;
///
/// assert_eq!(factorial(0), Some(1));
/// assert_eq!(factorial(4), Some(24));
/// assert_eq!(factorial(40), None);
/// ```
pub fn factorial(n: usize) -> Option<usize> {
    (2..=n).try_fold(1usize, |acc, k| acc.checked_mul(k))
}

/// Lehmer index of `p` in `[0, n!)`: for every position, the number of smaller labels to its
/// right weighted by the factorial of the positions remaining.
/// ```
/// use qpuzzle::puzzle::codec::encode;
/// use qpuzzle::puzzle::Permutation;
///
/// let p = Permutation::new(vec![1, 2, 3, 0]).unwrap();
/// assert_eq!(encode(&p), 9);
/// ```
pub fn encode(p: &Permutation) -> usize {
    let tiles = p.tiles();
    let n = tiles.len();
    // Permutations hold at most MAX_TILES tiles, so no factorial below overflows.
    let mut weight = 1usize;
    let mut index = 0usize;
    for i in (0..n).rev() {
        let smaller_right = tiles[i + 1..].iter().filter(|t| **t < tiles[i]).count();
        index += smaller_right * weight;
        weight *= n - i;
    }
    index
}

/// The permutation of `n` labels with Lehmer index `index`, inverse of [`encode`].
/// ```
/// use qpuzzle::puzzle::codec::decode;
///
/// let p = decode(9, 4).unwrap();
/// assert_eq!(p.tiles(), &[1, 2, 3, 0]);
/// assert!(decode(24, 4).is_err());
/// ```
pub fn decode(index: usize, n: usize) -> SearchResult<Permutation> {
    let bound = factorial(n)
        .filter(|_| n <= MAX_TILES)
        .ok_or_else(|| {
            SearchError::InvalidConfiguration(format!(
                "cannot index permutations of {} tiles, at most {} are supported",
                n, MAX_TILES
            ))
        })?;
    if index >= bound {
        return Err(SearchError::OutOfRange { index, n, bound });
    }

    let mut pool = (0..n).collect::<SmallVec<[usize; 8]>>();
    let mut remaining = index;
    let mut weight = bound;
    let mut tiles = SmallVec::<[usize; 8]>::with_capacity(n);
    for k in (0..n).rev() {
        weight /= k + 1;
        let pick = remaining / weight;
        remaining %= weight;
        tiles.push(pool.remove(pick));
    }
    Ok(Permutation { tiles })
}
