use num_bigint::BigInt;
use num_traits::Zero;
use thiserror::Error;

pub const MIN_BASE: u32 = 2;
pub const MAX_BASE: u32 = 36;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no valid base {base} digit in {digits:?}")]
    Empty { digits: String, base: u32 },
    #[error("unsupported base {0}, expected a base between 2 and 36")]
    UnsupportedBase(u32),
}

/// Decodes `digits` written in `base`, most significant digit first.
///
/// Letters are case-insensitive (`a` is 10, `z` is 35). Characters that are not a digit
/// of `base` are skipped rather than rejected, e.g. `decode("1_000", 10)` is `1000`.
pub fn decode(digits: &str, base: u32) -> Result<BigInt, DecodeError> {
    if !(MIN_BASE..=MAX_BASE).contains(&base) {
        return Err(DecodeError::UnsupportedBase(base));
    }

    let mut result = BigInt::zero();
    let mut digits_count = 0_usize;
    for digit in digits.chars().filter_map(|c| c.to_digit(base)) {
        result = result * base + digit;
        digits_count += 1;
    }

    if digits_count == 0 {
        return Err(DecodeError::Empty {
            digits: digits.to_string(),
            base,
        });
    }

    Ok(result)
}
