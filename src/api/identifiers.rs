use crate::api::AppState;
use crate::domain::IdentifierOption;
use crate::engine::identifier_options;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentifiersResponse {
    /// `null` while the identifier configuration has not loaded.
    pub options: Option<Vec<IdentifierOption>>,
}

pub async fn get_identifiers(State(state): State<AppState>) -> Json<IdentifiersResponse> {
    Json(IdentifiersResponse {
        options: identifier_options(state.identifiers.as_deref()),
    })
}
