use std::sync::Arc;

use axum::{debug_handler, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::APIState;

#[derive(Deserialize)]
pub struct TrimRequest {
    pub html: String,
}

#[derive(Serialize)]
pub struct TrimResponse {
    pub html: String,
    pub original_len: usize,
    pub trimmed_len: usize,
}

#[debug_handler]
pub async fn post_trim(
    State(state): State<Arc<APIState>>,
    Json(TrimRequest { html }): Json<TrimRequest>,
) -> Result<Json<TrimResponse>> {
    let original_len = html.len();

    let trimmed = state
        .switch
        .apply(state.rewriter.as_ref(), html.into_bytes());

    let html = String::from_utf8(trimmed)
        .map_err(|e| AppError::from(e).with_status(StatusCode::UNPROCESSABLE_ENTITY))?;

    Ok(Json(TrimResponse {
        trimmed_len: html.len(),
        original_len,
        html,
    }))
}
