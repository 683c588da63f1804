use anyhow::anyhow;
use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tracing::{error, info, warn};

use crate::{secret::SecretError, test_cases::TestCase};

use super::{ApiError, RouterState};

pub fn secrets_router() -> Router<RouterState> {
    Router::new()
        .route("/", post(solve_test_case))
        .route("/batch", post(solve_test_cases))
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SecretResponse {
    /// Decimal representation of the secret, which may not fit in 64 bits
    pub secret: String,
    /// Number of subsets that produced the secret
    pub occurrences: usize,
    /// Number of subsets evaluated
    pub combinations: u64,
    pub points: usize,
    pub k: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum TestCaseOutcome {
    Solved(SecretResponse),
    Failed { error: String },
}

async fn solve_test_case(
    State(state): State<RouterState>,
    body: String,
) -> Result<(StatusCode, Json<SecretResponse>), ApiError> {
    let test_case = TestCase::from_json(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let combinations = test_case.combination_count();
    if combinations > u128::from(state.max_combinations) {
        return Err(ApiError::Unprocessable(format!(
            "{combinations} subsets of {} out of {} points exceed the limit of {} subsets",
            test_case.k,
            test_case.points.len(),
            state.max_combinations
        )));
    }

    let response = search_secret(test_case).await?;

    info!(
        "secret {} found by {}/{} subsets",
        response.secret, response.occurrences, response.combinations
    );

    Ok((StatusCode::OK, Json(response)))
}

/// Solves every test case independently, a failing test case is reported in its own
/// outcome without affecting the others. The subsets searched over the whole batch share
/// a single `max_combinations` budget, test cases that do not fit in what is left fail.
async fn solve_test_cases(
    State(state): State<RouterState>,
    body: String,
) -> Result<(StatusCode, Json<Vec<TestCaseOutcome>>), ApiError> {
    // Test cases are kept as raw JSON, see `TestCase::from_json`
    let documents = serde_json::from_str::<Vec<Box<RawValue>>>(&body)
        .map_err(|e| ApiError::BadRequest(format!("expected an array of test cases: {e}")))?;
    let mut remaining_combinations = u128::from(state.max_combinations);
    let mut outcomes = Vec::with_capacity(documents.len());
    for (i, document) in documents.iter().enumerate() {
        let outcome = match TestCase::from_json(document.get()) {
            Ok(test_case) => {
                let combinations = test_case.combination_count();
                if combinations > remaining_combinations {
                    TestCaseOutcome::Failed {
                        error: format!(
                            "{combinations} subsets exceed the {remaining_combinations} subsets left out of the batch limit of {}",
                            state.max_combinations
                        ),
                    }
                } else {
                    remaining_combinations -= combinations;
                    match search_secret(test_case).await {
                        Ok(response) => TestCaseOutcome::Solved(response),
                        Err(ApiError::BadRequest(error)) | Err(ApiError::Unprocessable(error)) => {
                            TestCaseOutcome::Failed { error }
                        }
                        Err(e) => {
                            error!("searching the secret of test case {}: {:?}", i + 1, e);
                            TestCaseOutcome::Failed {
                                error: "internal error while searching the secret".to_string(),
                            }
                        }
                    }
                }
            }
            Err(e) => TestCaseOutcome::Failed {
                error: e.to_string(),
            },
        };
        if let TestCaseOutcome::Failed { error } = &outcome {
            warn!("no secret could be determined for test case {}: {}", i + 1, error);
        }
        outcomes.push(outcome);
    }

    Ok((StatusCode::OK, Json(outcomes)))
}

async fn search_secret(test_case: TestCase) -> Result<SecretResponse, ApiError> {
    let points = test_case.points.len();
    let k = test_case.k;
    let tally = tokio::task::spawn_blocking(move || test_case.tally())
        .await
        .map_err(|e| anyhow!("{e}").context("running the secret search"))?
        .map_err(|e| match e {
            SecretError::InvalidInput(_)
            | SecretError::InsufficientData { .. } => ApiError::BadRequest(e.to_string()),
        })?;

    let (secret, occurrences) = tally
        .majority()
        .ok_or_else(|| anyhow!("secret search finished without evaluating any subset"))?;

    Ok(SecretResponse {
        secret: secret.to_string(),
        occurrences,
        combinations: u64::try_from(tally.combinations()).unwrap_or(u64::MAX),
        points,
        k,
    })
}
