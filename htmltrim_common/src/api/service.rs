use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::state::APIState;

use super::{switch::put_switch, trim::post_trim};

pub fn service(state: Arc<APIState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/trim", post(post_trim))
        .route("/switch", put(put_switch))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index(State(state): State<Arc<APIState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        format!(
            "Serving {} with trimming {}",
            state.config.root.display(),
            if state.switch.is_enabled() {
                "enabled"
            } else {
                "disabled"
            }
        ),
    )
}
