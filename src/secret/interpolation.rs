use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use super::{Point, SecretError, ensure_distinct_abscissas};

/// Evaluates at `x = 0` the unique polynomial of degree `< points.len()` going through
/// `points`, using Lagrange's formula:
/// ```text
/// P(0) = Σ_i y_i * Π_{j != i} (-x_j) / (x_i - x_j)
/// ```
/// The sum is computed exactly over the rationals and rounded once to the nearest
/// integer, halves away from zero. Points of an integer polynomial therefore give back
/// its constant term exactly.
pub fn interpolate_at_zero(points: &[Point]) -> Result<BigInt, SecretError> {
    if points.is_empty() {
        return Err(SecretError::InvalidInput(
            "at least one point is required to interpolate".to_string(),
        ));
    }
    ensure_distinct_abscissas(points)?;

    let mut sum = BigRational::zero();
    for (i, point) in points.iter().enumerate() {
        let mut numerator = point.y().clone();
        let mut denominator = BigInt::one();
        for (j, other) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            numerator *= -other.x();
            denominator *= point.x() - other.x();
        }
        sum += BigRational::new(numerator, denominator);
    }

    Ok(sum.round().to_integer())
}
