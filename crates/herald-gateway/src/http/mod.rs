pub mod bulk;
pub mod health;
pub mod send;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use herald_core::error::DispatchError;

/// Error body returned by every endpoint: human detail plus a stable code.
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: &'static str,
}

pub fn bad_request(detail: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: detail.to_string(),
            code: "BAD_REQUEST",
        }),
    )
}

/// HTTP-equivalent status per dispatch error kind.
///
/// User-addressable problems are 400s; a missing target is 404; throttling is
/// 429; a connection that is not (yet) usable is 503 so clients may retry;
/// everything else from Discord surfaces as 502.
pub fn status_for(error: &DispatchError) -> StatusCode {
    match error {
        DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
        DispatchError::MemberSearchUnavailable
        | DispatchError::Unreachable(_)
        | DispatchError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
        DispatchError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        DispatchError::ConnectionFault(_) => StatusCode::SERVICE_UNAVAILABLE,
        DispatchError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

pub fn dispatch_rejection(error: DispatchError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(&error);
    (
        status,
        Json(ApiError {
            error: error.to_string(),
            code: error.code(),
        }),
    )
}
