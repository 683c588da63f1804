use std::collections::HashSet;

use num_bigint::BigInt;
use thiserror::Error;

pub mod decoder;
pub mod interpolation;
pub mod search;

pub use decoder::{DecodeError, decode};
pub use interpolation::interpolate_at_zero;
pub use search::{
    Combinations, SecretTally, combination_count, find_majority_secret, tally_secrets,
};

/// A point of the hidden polynomial, `y` being the polynomial evaluated at `x`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Point {
    x: BigInt,
    y: BigInt,
}

impl Point {
    pub fn new(x: impl Into<BigInt>, y: impl Into<BigInt>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }

    pub fn x(&self) -> &BigInt {
        &self.x
    }

    pub fn y(&self) -> &BigInt {
        &self.y
    }
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("insufficient data: {points} point(s) available but {k} required")]
    InsufficientData { points: usize, k: usize },
}

/// Recovers the secret of one test case, i.e. the majority value at `x = 0` over every
/// subset of `k` points.
pub fn solve(points: &[Point], k: usize) -> Result<BigInt, SecretError> {
    find_majority_secret(points, k)
}

pub(crate) fn validate_point_set(points: &[Point], k: usize) -> Result<(), SecretError> {
    if k == 0 {
        return Err(SecretError::InvalidInput(
            "k must be at least 1".to_string(),
        ));
    }
    if points.len() < k {
        return Err(SecretError::InsufficientData {
            points: points.len(),
            k,
        });
    }
    ensure_distinct_abscissas(points)
}

pub(crate) fn ensure_distinct_abscissas(points: &[Point]) -> Result<(), SecretError> {
    let mut seen = HashSet::with_capacity(points.len());
    for point in points {
        if !seen.insert(point.x()) {
            return Err(SecretError::InvalidInput(format!(
                "duplicate x value {}",
                point.x()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_quadratic() {
        // 4x^2 + 18x + 4
        let points: Vec<Point> = [(1, 26), (2, 56), (3, 94), (4, 140), (5, 194), (6, 256)]
            .into_iter()
            .map(|(x, y)| Point::new(x, y))
            .collect();
        assert_eq!(solve(&points, 3).unwrap(), BigInt::from(4));
    }

    #[test]
    fn test_solve_rejects_zero_threshold() {
        let points = vec![Point::new(1, 2)];
        assert!(matches!(
            solve(&points, 0),
            Err(SecretError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_solve_rejects_duplicate_abscissas() {
        let points = vec![Point::new(1, 2), Point::new(2, 3), Point::new(1, 4)];
        assert!(matches!(
            solve(&points, 2),
            Err(SecretError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_solve_insufficient_data() {
        let points = vec![Point::new(1, 2), Point::new(2, 3)];
        match solve(&points, 3) {
            Err(SecretError::InsufficientData { points, k }) => {
                assert_eq!(points, 2);
                assert_eq!(k, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
