//! Specsheet Insights Service
//!
//! Read-only views over persisted parameters: cross-supplier comparison
//! and natural-language querying by keyword intent.

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use specsheet_database::{
    create_postgres_pool, run_postgres_migrations, ParameterRepository, QueryRepository,
    StoreMetrics,
};
use specsheet_models::QueryRecord;
use specsheet_utils::{init_logging, AppConfig, MistralClient, SpecsheetError};

mod comparison;
mod query;

use query::{AnsweredQuery, QueryService};

#[derive(Clone)]
pub struct AppState {
    pub parameters: Arc<ParameterRepository>,
    pub queries: Arc<QueryRepository>,
    pub query_service: Arc<QueryService>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|_| AppConfig::default());
    init_logging(&config.logging)?;
    info!("Starting Specsheet Insights Service");

    let pool = create_postgres_pool(&config.database.url, config.database.max_connections).await?;
    run_postgres_migrations(&pool).await?;

    let parameters = Arc::new(ParameterRepository::new(pool.clone()));
    let queries = Arc::new(QueryRepository::new(pool));

    let ai = if config.ai.is_enabled() {
        Some(MistralClient::new(&config.ai)?)
    } else {
        info!("No AI API key configured, unmatched questions get a fixed answer");
        None
    };

    let state = AppState {
        parameters: parameters.clone(),
        queries: queries.clone(),
        query_service: Arc::new(QueryService::new(parameters, queries, ai)?),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/compare/:parameter", get(comparison::compare_parameter))
        .route("/api/v1/parameters", get(comparison::list_parameters))
        .route("/api/v1/suppliers", get(comparison::list_suppliers))
        .route("/api/v1/query", post(answer_query))
        .route("/api/v1/queries", get(recent_queries))
        .route("/api/v1/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8082));
    let listener = TcpListener::bind(&addr).await?;
    info!("Insights Service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "insights",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    question: String,
}

async fn answer_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<AnsweredQuery>, (StatusCode, String)> {
    if request.question.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question is empty".to_string()));
    }

    let answered = state
        .query_service
        .answer(request.question.trim())
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(answered))
}

async fn recent_queries(
    State(state): State<AppState>,
) -> Result<Json<Vec<QueryRecord>>, (StatusCode, String)> {
    let records = state
        .queries
        .recent(50)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(records))
}

async fn metrics(
    State(state): State<AppState>,
) -> Result<Json<StoreMetrics>, (StatusCode, String)> {
    let metrics = state
        .parameters
        .metrics()
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(metrics))
}

pub(crate) fn error_response(error: &SpecsheetError) -> (StatusCode, String) {
    let status = StatusCode::from_u16(error.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, error.to_string())
}
