use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{FlowCycle, FlowDay, FlowIntensity};
use crate::store::DynStore;

#[derive(Deserialize)]
struct UserQuery {
    user_id: Uuid,
}

#[derive(Deserialize)]
pub struct NewFlowLog {
    pub user_id: Uuid,
    pub logged_at: NaiveDate,
    pub intensity: FlowIntensity,
}

pub fn routes(store: DynStore) -> Router {
    Router::new()
        .route("/flow", post(log_flow))
        .route("/flow-history", get(get_flow_history))
        .with_state(store)
}

async fn log_flow(
    State(store): State<DynStore>,
    Json(body): Json<NewFlowLog>,
) -> Result<StatusCode, StatusCode> {
    store
        .log_flow(body.user_id, body.logged_at, body.intensity)
        .await
        .map_err(|e| {
            tracing::error!("❌ Failed to log flow: {}", e);
            StatusCode::UNPROCESSABLE_ENTITY
        })?;
    Ok(StatusCode::CREATED)
}

/// Logged flow days grouped under the period they belong to, oldest first.
async fn get_flow_history(
    State(store): State<DynStore>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<FlowCycle>>, (StatusCode, String)> {
    let periods = store.list_periods(params.user_id).await.map_err(|e| {
        tracing::error!("❌ DB error: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "DB error".into())
    })?;

    let grouped: Vec<FlowCycle> = periods
        .into_iter()
        .rev()
        .map(|p| FlowCycle {
            start_date: p.start_date,
            end_date: p.end_date,
            days: p
                .flow_by_date
                .into_iter()
                .map(|(date, intensity)| FlowDay { date, intensity })
                .collect(),
        })
        .collect();

    Ok(Json(grouped))
}
