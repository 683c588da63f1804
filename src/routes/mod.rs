use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::Config;

mod layers;
pub mod secrets;

pub use layers::{REQUEST_ID_HEADER, with_http_layers};

#[derive(Clone)]
pub struct RouterState {
    max_combinations: u64,
}

pub fn app_router(config: &Config) -> Router {
    let state = RouterState {
        max_combinations: config.max_combinations,
    };
    Router::new()
        .route("/health", get(get_healthcheck))
        .nest("/secrets", secrets::secrets_router())
        .fallback(not_found_handler)
        .with_state(state)
}

#[derive(Serialize, Deserialize)]
pub struct GetHealthcheckResponse {
    pub ok: bool,
}
async fn get_healthcheck() -> (StatusCode, Json<GetHealthcheckResponse>) {
    (StatusCode::OK, Json(GetHealthcheckResponse { ok: true }))
}

async fn not_found_handler() -> impl IntoResponse {
    ApiError::NotFound
}

// ############################################
// ################## ERRORS ##################
// ############################################

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    InternalServerError(anyhow::Error),
    BadRequest(String),
    Unprocessable(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalServerError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            Self::InternalServerError(e) => {
                error!("Internal server error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            Self::Unprocessable(msg) => {
                warn!("Unprocessable request: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response()
            }
        }
    }
}
