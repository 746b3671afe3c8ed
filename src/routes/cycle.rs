use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::CycleData;
use crate::predictor;
use crate::store::{DynStore, StoreError};

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct NewPeriod {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct EndPeriod {
    pub user_id: Uuid,
    pub end_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct DeletePeriodRequest {
    pub user_id: Uuid,
    pub period_id: Uuid,
}

pub fn routes(store: DynStore) -> Router {
    Router::new()
        .route(
            "/cycle",
            get(get_cycle_summary)
                .post(log_period_start)
                .delete(delete_period),
        )
        .route("/cycle/end", put(log_period_end))
        .with_state(store)
}

async fn get_cycle_summary(
    State(store): State<DynStore>,
    Query(params): Query<UserQuery>,
) -> Result<Json<CycleData>, StatusCode> {
    let history = store.list_periods(params.user_id).await.map_err(internal)?;
    let settings = store.get_settings(params.user_id).await.map_err(internal)?;

    // Clock read stays at the boundary; the predictor is pure.
    let today = chrono::Utc::now().date_naive();
    Ok(Json(predictor::compute_cycle_data(&history, &settings, today)))
}

async fn log_period_start(
    State(store): State<DynStore>,
    Json(body): Json<NewPeriod>,
) -> Result<StatusCode, StatusCode> {
    store
        .create_period(body.user_id, body.start_date)
        .await
        .map_err(|e| {
            tracing::error!("❌ Failed to log period start: {}", e);
            StatusCode::UNPROCESSABLE_ENTITY
        })?;
    Ok(StatusCode::CREATED)
}

async fn log_period_end(
    State(store): State<DynStore>,
    Json(body): Json<EndPeriod>,
) -> Result<StatusCode, (StatusCode, String)> {
    match store.close_period(body.user_id, body.end_date).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::NotFound) => {
            Err((StatusCode::NOT_FOUND, "No open period to end".into()))
        }
        Err(StoreError::InvalidEndDate) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "End date is before the period start".into(),
        )),
        Err(e) => {
            tracing::error!("❌ Failed to log period end: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "DB error".into()))
        }
    }
}

async fn delete_period(
    State(store): State<DynStore>,
    Json(body): Json<DeletePeriodRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    match store.delete_period(body.user_id, body.period_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::NotFound) => Err((StatusCode::NOT_FOUND, "No such period".into())),
        Err(e) => {
            tracing::error!("❌ Failed to delete period: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "DB error".into()))
        }
    }
}

fn internal(e: StoreError) -> StatusCode {
    tracing::error!("❌ DB error: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}
