use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::CycleHistoryEntry;
use crate::predictor;
use crate::store::DynStore;

#[derive(Deserialize)]
struct UserQuery {
    user_id: Uuid,
}

pub fn routes(store: DynStore) -> Router {
    Router::new()
        .route("/cycle-history", get(get_cycle_history))
        .with_state(store)
}

/// Completed cycles, oldest first, raw lengths with no outlier filtering.
async fn get_cycle_history(
    State(store): State<DynStore>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<CycleHistoryEntry>>, StatusCode> {
    let history = store.list_periods(params.user_id).await.map_err(|e| {
        tracing::error!("❌ DB error in get_cycle_history: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(predictor::compute_cycle_history(&history)))
}
