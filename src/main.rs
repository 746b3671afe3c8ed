use anyhow::Result;
use axum::{routing::get, Router};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::{env, net::SocketAddr, sync::Arc};

mod models;
mod predictor;
mod routes;
mod store;

use store::{DynStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let store: DynStore = Arc::new(PgStore::new(pool));

    let app = Router::new()
        .merge(routes::cycle::routes(store.clone()))
        .merge(routes::flow::routes(store.clone()))
        .merge(routes::history::routes(store.clone()))
        .merge(routes::insights::routes(store.clone()))
        .merge(routes::settings::routes(store.clone()))
        .route("/health", get(|| async { "✅ Backend up" }));

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3050);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("🩸 Server running at {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
