use std::collections::BTreeMap;

use num_bigint::BigInt;
use tracing::{debug, warn};

use super::{Point, SecretError, interpolate_at_zero, validate_point_set};

/// Number of subsets above which a search is reported as expensive.
pub const LARGE_SEARCH_WARNING_THRESHOLD: u128 = 100_000;

/// Lazily enumerates every combination of `k` indices out of `n`.
///
/// Combinations follow the lexicographic order of an `n`-length 0/1 indicator mask,
/// starting with the `k` ones at the end, e.g. for `n = 3, k = 2`: `[1, 2]`, `[0, 2]`,
/// `[0, 1]`. Dropping the iterator stops the enumeration.
pub struct Combinations {
    mask: Vec<bool>,
    exhausted: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        if k > n {
            return Self {
                mask: vec![],
                exhausted: true,
            };
        }
        let mut mask = vec![false; n - k];
        mask.extend(std::iter::repeat_n(true, k));
        Self {
            mask,
            exhausted: false,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let indices = self
            .mask
            .iter()
            .enumerate()
            .filter_map(|(i, &selected)| selected.then_some(i))
            .collect();
        self.exhausted = !next_permutation(&mut self.mask);
        Some(indices)
    }
}

/// Rearranges `mask` into its lexicographically next permutation, returns `false` once the
/// last permutation has been reached.
fn next_permutation(mask: &mut [bool]) -> bool {
    let Some(pivot) = mask.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    // Rightmost element greater than the pivot, it exists as `mask[pivot + 1]` is one
    let Some(offset) = mask[pivot + 1..].iter().rposition(|&b| b > mask[pivot]) else {
        return false;
    };
    mask.swap(pivot, pivot + 1 + offset);
    mask[pivot + 1..].reverse();
    true
}

/// Number of ways to pick `k` elements out of `n`, saturating at `u128::MAX`.
pub fn combination_count(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k) as u128;
    let n = n as u128;
    let mut count = 1_u128;
    for i in 0..k {
        // count * (n - i) is always divisible by i + 1
        count = match count.checked_mul(n - i) {
            Some(v) => v / (i + 1),
            None => return u128::MAX,
        };
    }
    count
}

/// Occurrences of every secret produced by the subsets of one point set.
#[derive(Clone, Debug, Default)]
pub struct SecretTally {
    counts: BTreeMap<BigInt, usize>,
    combinations: u128,
}

impl SecretTally {
    pub fn record(&mut self, secret: BigInt) {
        *self.counts.entry(secret).or_default() += 1;
        self.combinations += 1;
    }

    pub fn counts(&self) -> &BTreeMap<BigInt, usize> {
        &self.counts
    }

    /// Number of subsets that have been recorded.
    pub fn combinations(&self) -> u128 {
        self.combinations
    }

    /// Most frequent secret with its number of occurrences. Among equally frequent
    /// secrets the smallest one wins.
    pub fn majority(&self) -> Option<(&BigInt, usize)> {
        let mut majority: Option<(&BigInt, usize)> = None;
        // Keys are visited in ascending order, only a strictly greater count replaces
        for (secret, &count) in &self.counts {
            if majority.is_none_or(|(_, best)| count > best) {
                majority = Some((secret, count));
            }
        }
        majority
    }
}

/// Interpolates every subset of `k` points and tallies the resulting secrets.
pub fn tally_secrets(points: &[Point], k: usize) -> Result<SecretTally, SecretError> {
    validate_point_set(points, k)?;

    let expected = combination_count(points.len(), k);
    if expected > LARGE_SEARCH_WARNING_THRESHOLD {
        warn!(
            "searching {expected} subsets of {k} out of {} points, this grows combinatorially with the number of points",
            points.len()
        );
    }

    let mut tally = SecretTally::default();
    let mut subset = Vec::with_capacity(k);
    for indices in Combinations::new(points.len(), k) {
        subset.clear();
        subset.extend(indices.into_iter().map(|i| points[i].clone()));
        tally.record(interpolate_at_zero(&subset)?);
    }

    debug!(
        "{} subsets evaluated, {} distinct secrets",
        tally.combinations(),
        tally.counts().len()
    );

    Ok(tally)
}

/// Returns the secret produced by the largest number of `k`-subsets of `points`, the
/// smallest one in case of a tie.
pub fn find_majority_secret(points: &[Point], k: usize) -> Result<BigInt, SecretError> {
    let tally = tally_secrets(points, k)?;
    tally
        .majority()
        .map(|(secret, _)| secret.clone())
        .ok_or_else(|| SecretError::InvalidInput("no subset could be evaluated".to_string()))
}
