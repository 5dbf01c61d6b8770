use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::common::AppState;
use crate::error::{AppError, AppResult};

/// Serve a staged upload so the entry form can show it.
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Response> {
    let file = state
        .previews
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Preview {id} not found")))?;

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.clone()),
            (header::CACHE_CONTROL, "private, no-store".to_string()),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        file.bytes,
    )
        .into_response())
}
