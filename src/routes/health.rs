use axum::http::StatusCode;

/// Liveness probe. Does not touch the shop backend.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
