use std::sync::Arc;

use axum::{debug_handler, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::state::APIState;

#[derive(Serialize, Deserialize)]
pub struct SwitchState {
    pub enabled: bool,
}

#[debug_handler]
pub async fn put_switch(
    State(state): State<Arc<APIState>>,
    Json(SwitchState { enabled }): Json<SwitchState>,
) -> Json<SwitchState> {
    state.switch.set(enabled);

    Json(SwitchState {
        enabled: state.switch.is_enabled(),
    })
}
