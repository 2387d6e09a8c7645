use crate::api::AppState;
use crate::domain::{Address, Position};
use crate::error::AppError;
use crate::orchestration::{PositionSession, SessionOutcome};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct PositionsQuery {
    pub account: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsResponse {
    pub account: String,
    pub positions: Vec<Position>,
}

pub async fn get_positions(
    Query(params): Query<PositionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<PositionsResponse>, AppError> {
    let account = Address::from_str(&params.account)
        .map_err(|_| AppError::BadRequest("Invalid account address".into()))?;

    let mut session = PositionSession::new(
        state.reader.clone(),
        account.clone(),
        state.config.explorer_url.clone(),
    );
    let timeout = Duration::from_millis(state.config.resolve_timeout_ms);
    let outcome = tokio::time::timeout(timeout, session.resolve())
        .await
        .map_err(|_| {
            AppError::Unavailable(format!(
                "positions for {} still resolving after {}ms",
                account, state.config.resolve_timeout_ms
            ))
        })??;

    match outcome {
        SessionOutcome::Resolved(positions) => Ok(Json(PositionsResponse {
            account: account.to_string(),
            positions,
        })),
        SessionOutcome::Stalled { failed } => {
            let keys: Vec<String> = failed.iter().map(|k| k.to_string()).collect();
            Err(AppError::Upstream(format!(
                "{} contract reads failed: {}",
                failed.len(),
                keys.join(", ")
            )))
        }
    }
}
