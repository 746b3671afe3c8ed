use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::Insight;
use crate::predictor;
use crate::store::DynStore;

#[derive(Deserialize)]
struct UserQuery {
    user_id: Uuid,
}

pub fn routes(store: DynStore) -> Router {
    Router::new()
        .route("/insights", get(get_daily_insights))
        .with_state(store)
}

async fn get_daily_insights(
    State(store): State<DynStore>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<Insight>>, StatusCode> {
    let history = store.list_periods(params.user_id).await.map_err(internal)?;
    let settings = store.get_settings(params.user_id).await.map_err(internal)?;

    let today = chrono::Utc::now().date_naive();
    let data = predictor::compute_cycle_data(&history, &settings, today);
    Ok(Json(predictor::daily_insights(&data)))
}

fn internal(e: crate::store::StoreError) -> StatusCode {
    tracing::error!("❌ DB error in get_daily_insights: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}
