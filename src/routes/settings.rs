use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::SettingsRecord;
use crate::store::DynStore;

#[derive(Deserialize)]
struct UserQuery {
    user_id: Uuid,
}

#[derive(Deserialize)]
pub struct UpdateSettings {
    pub user_id: Uuid,
    pub default_cycle_length: i64,
    pub default_period_length: i64,
}

pub fn routes(store: DynStore) -> Router {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .with_state(store)
}

async fn get_settings(
    State(store): State<DynStore>,
    Query(params): Query<UserQuery>,
) -> Result<Json<SettingsRecord>, StatusCode> {
    let settings = store.get_settings(params.user_id).await.map_err(|e| {
        tracing::error!("❌ DB error in get_settings: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(settings))
}

async fn update_settings(
    State(store): State<DynStore>,
    Json(body): Json<UpdateSettings>,
) -> Result<StatusCode, (StatusCode, String)> {
    if body.default_cycle_length <= 0 || body.default_period_length <= 0 {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "Cycle and period lengths must be positive".into(),
        ));
    }

    store
        .update_settings(
            body.user_id,
            SettingsRecord {
                default_cycle_length: body.default_cycle_length,
                default_period_length: body.default_period_length,
            },
        )
        .await
        .map_err(|e| {
            tracing::error!("❌ Failed to update settings: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "DB error".into())
        })?;

    Ok(StatusCode::NO_CONTENT)
}
