use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::{MatchedPath, Request},
    http::{HeaderName, Response},
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};

use crate::Config;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Wraps `router` with request ids, request tracing and the request timeout.
pub fn with_http_layers(router: Router, config: &Config) -> Router {
    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router.layer((
        SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid),
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);

                info_span!(
                    "http_request",
                    method = ?request.method(),
                    matched_path,
                    request_id = ?request.headers().get(REQUEST_ID_HEADER),
                )
            })
            .on_response(
                |response: &Response<Body>, latency: Duration, _span: &Span| {
                    if response.status().is_server_error() {
                        error!("response: {} {latency:?}", response.status())
                    } else {
                        info!("response: {} {latency:?}", response.status())
                    }
                },
            ),
        // A search still running when the timeout fires keeps its blocking thread until it
        // completes, only the response is dropped
        TimeoutLayer::new(config.request_timeout),
        PropagateRequestIdLayer::new(x_request_id),
    ))
}
