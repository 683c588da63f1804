use std::collections::BTreeMap;

use num_bigint::BigInt;
use serde::Deserialize;
use serde_json::value::RawValue;
use thiserror::Error;
use tracing::{debug, warn};

use crate::secret::{self, DecodeError, Point, SecretError, SecretTally};

/// A decoded test case: the points of the hidden polynomial and the number of points
/// needed to determine it.
#[derive(Clone, Debug)]
pub struct TestCase {
    pub k: usize,
    /// Number of points announced by the document, if any
    pub declared_n: Option<usize>,
    pub points: Vec<Point>,
    /// Base each point's value was written in, in the order of `points`
    pub bases: Vec<u32>,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed test case: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing `k`, expected either a top level `k` or `keys.k`")]
    MissingThreshold,
    #[error("point key {0:?} is not a decimal integer")]
    InvalidKey(String),
    #[error("point {key}: `{field}` must be a string or an unsigned integer, got {text}")]
    InvalidField {
        key: String,
        field: &'static str,
        text: String,
    },
    #[error("point {key}: invalid base {base:?}")]
    InvalidBase { key: String, base: String },
    #[error("point {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: DecodeError,
    },
    #[error("point key {0:?} refers to an x value already used by another key")]
    DuplicateKey(String),
}

// ##################################################
// ################## RAW DOCUMENT ##################
// ##################################################

const THRESHOLD_KEY: &str = "k";
const KEYS_KEY: &str = "keys";

#[derive(Deserialize)]
struct RawKeys {
    n: Option<usize>,
    k: Option<usize>,
}

// Fields are kept as raw JSON so that unquoted numbers reach the decoder with their
// original digits, a JSON number longer than 20 digits would otherwise become a float
#[derive(Deserialize)]
struct RawPoint {
    base: Box<RawValue>,
    value: Box<RawValue>,
}

/// Text of a point field, either the content of a JSON string or the literal digits of
/// an unquoted unsigned integer.
fn field_text(key: &str, field: &'static str, raw: &RawValue) -> Result<String, IngestError> {
    let text = raw.get().trim();
    if text.starts_with('"') {
        return Ok(serde_json::from_str::<String>(text)?);
    }
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(text.to_string());
    }
    Err(IngestError::InvalidField {
        key: key.to_string(),
        field,
        text: text.to_string(),
    })
}

// ##################################################
// ################## INGESTION #####################
// ##################################################

impl TestCase {
    pub fn from_json(raw: &str) -> Result<Self, IngestError> {
        let mut document = serde_json::from_str::<BTreeMap<String, Box<RawValue>>>(raw)?;

        let keys = document
            .remove(KEYS_KEY)
            .map(|raw_keys| serde_json::from_str::<RawKeys>(raw_keys.get()))
            .transpose()?;
        // A top level `k` has priority over `keys.k`
        let k = document
            .remove(THRESHOLD_KEY)
            .map(|raw_k| serde_json::from_str::<usize>(raw_k.get()))
            .transpose()?
            .or_else(|| keys.as_ref().and_then(|keys| keys.k))
            .ok_or(IngestError::MissingThreshold)?;
        let declared_n = keys.as_ref().and_then(|keys| keys.n);

        let mut decoded_points: BTreeMap<BigInt, (BigInt, u32)> = BTreeMap::new();
        for (key, raw_point) in document {
            let x = key
                .trim()
                .parse::<BigInt>()
                .map_err(|_| IngestError::InvalidKey(key.clone()))?;
            let raw_point = serde_json::from_str::<RawPoint>(raw_point.get())?;
            let raw_base = field_text(&key, "base", &raw_point.base)?;
            let base = raw_base
                .trim()
                .parse::<u32>()
                .map_err(|_| IngestError::InvalidBase {
                    key: key.clone(),
                    base: raw_base.clone(),
                })?;
            let digits = field_text(&key, "value", &raw_point.value)?;
            let y = secret::decode(&digits, base).map_err(|source| IngestError::Decode {
                key: key.clone(),
                source,
            })?;

            debug!("parsed point: x = {x}, y = {y} (base {base})");

            if decoded_points.insert(x, (y, base)).is_some() {
                return Err(IngestError::DuplicateKey(key));
            }
        }

        if let Some(n) = declared_n
            && n != decoded_points.len()
        {
            warn!(
                "test case declares {n} points but contains {}, using the points found",
                decoded_points.len()
            );
        }

        let (points, bases) = decoded_points
            .into_iter()
            .map(|(x, (y, base))| (Point::new(x, y), base))
            .unzip();

        Ok(Self {
            k,
            declared_n,
            points,
            bases,
        })
    }

    /// Points paired with the base their value was written in.
    pub fn parsed_points(&self) -> impl Iterator<Item = (&Point, u32)> {
        self.points.iter().zip(self.bases.iter().copied())
    }

    /// Majority secret of the test case.
    pub fn solve(&self) -> Result<BigInt, SecretError> {
        secret::solve(&self.points, self.k)
    }

    /// Full tally of the secrets produced by every subset of `k` points.
    pub fn tally(&self) -> Result<SecretTally, SecretError> {
        secret::tally_secrets(&self.points, self.k)
    }

    /// Number of subsets a search over this test case evaluates.
    pub fn combination_count(&self) -> u128 {
        secret::combination_count(self.points.len(), self.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASHIRA_LAYOUT: &str = r#"{
        "keys": {
            "n": 4,
            "k": 3
        },
        "1": {
            "base": "10",
            "value": "4"
        },
        "2": {
            "base": "2",
            "value": "111"
        },
        "3": {
            "base": "10",
            "value": "12"
        },
        "6": {
            "base": "4",
            "value": "213"
        }
    }"#;

    #[test]
    fn test_nested_keys_layout() {
        let test_case = TestCase::from_json(HASHIRA_LAYOUT).unwrap();
        assert_eq!(test_case.k, 3);
        assert_eq!(test_case.declared_n, Some(4));
        assert_eq!(
            test_case.points,
            vec![
                Point::new(1, 4),
                Point::new(2, 7),
                Point::new(3, 12),
                Point::new(6, 39)
            ]
        );
        assert_eq!(test_case.combination_count(), 4);
        assert_eq!(test_case.solve().unwrap(), BigInt::from(3));
    }

    #[test]
    fn test_flat_layout_with_integer_fields() {
        let test_case = TestCase::from_json(
            r#"{ "k": 2, "10": { "base": 16, "value": "1a" }, "-2": { "base": 10, "value": 2 } }"#,
        )
        .unwrap();
        assert_eq!(test_case.k, 2);
        assert_eq!(test_case.declared_n, None);
        // Points are ordered by x
        assert_eq!(
            test_case.points,
            vec![Point::new(-2, 2), Point::new(10, 26)]
        );
        // 2x + 6
        assert_eq!(test_case.solve().unwrap(), BigInt::from(6));
    }

    #[test]
    fn test_unquoted_value_longer_than_64_bits() {
        let test_case =
            TestCase::from_json(r#"{ "k": 1, "1": { "base": "2", "value": 111111111111111111111 } }"#)
                .unwrap();
        assert_eq!(test_case.points, vec![Point::new(1, 2_097_151)]);

        // 30 digits, beyond what a JSON number keeps exactly
        let test_case = TestCase::from_json(
            r#"{ "k": 1, "4": { "base": 10, "value": 123456789012345678901234567890 } }"#,
        )
        .unwrap();
        assert_eq!(
            test_case.points[0].y().to_string(),
            "123456789012345678901234567890"
        );
    }

    #[test]
    fn test_unquoted_value_must_be_an_unsigned_integer() {
        for value in ["-12", "1.5", "true", "[1]"] {
            let err = TestCase::from_json(&format!(
                r#"{{ "k": 1, "1": {{ "base": "10", "value": {value} }} }}"#
            ))
            .unwrap_err();
            assert!(matches!(err, IngestError::InvalidField { field: "value", .. }));
        }
    }

    #[test]
    fn test_bases_follow_points() {
        let test_case = TestCase::from_json(HASHIRA_LAYOUT).unwrap();
        assert_eq!(test_case.bases, vec![10, 2, 10, 4]);
        let parsed: Vec<(i64, u32)> = test_case
            .parsed_points()
            .map(|(point, base)| (point.x().try_into().unwrap(), base))
            .collect();
        assert_eq!(parsed, vec![(1, 10), (2, 2), (3, 10), (6, 4)]);
    }

    #[test]
    fn test_missing_threshold() {
        let err = TestCase::from_json(r#"{ "1": { "base": "10", "value": "4" } }"#).unwrap_err();
        assert!(matches!(err, IngestError::MissingThreshold));
    }

    #[test]
    fn test_invalid_key() {
        let err = TestCase::from_json(r#"{ "k": 1, "one": { "base": "10", "value": "4" } }"#)
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidKey(key) if key == "one"));
    }

    #[test]
    fn test_invalid_base() {
        let err = TestCase::from_json(r#"{ "k": 1, "1": { "base": "ten", "value": "4" } }"#)
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidBase { .. }));
        let err = TestCase::from_json(r#"{ "k": 1, "1": { "base": "40", "value": "4" } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Decode {
                source: DecodeError::UnsupportedBase(40),
                ..
            }
        ));
    }

    #[test]
    fn test_undecodable_value() {
        let err = TestCase::from_json(r#"{ "k": 1, "7": { "base": "2", "value": "789" } }"#)
            .unwrap_err();
        assert!(matches!(err, IngestError::Decode { key, .. } if key == "7"));
    }

    #[test]
    fn test_duplicate_abscissa() {
        let err = TestCase::from_json(
            r#"{ "k": 1, "1": { "base": "10", "value": "4" }, "01": { "base": "10", "value": "5" } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::DuplicateKey(_)));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            TestCase::from_json("{ \"k\": 1, "),
            Err(IngestError::Json(_))
        ));
        assert!(matches!(
            TestCase::from_json(r#"{ "k": 1, "1": { "value": "4" } }"#),
            Err(IngestError::Json(_))
        ));
    }

    #[test]
    fn test_insufficient_points() {
        let test_case = TestCase::from_json(
            r#"{ "keys": { "n": 1, "k": 2 }, "1": { "base": "10", "value": "4" } }"#,
        )
        .unwrap();
        assert!(matches!(
            test_case.solve(),
            Err(SecretError::InsufficientData { points: 1, k: 2 })
        ));
    }
}
