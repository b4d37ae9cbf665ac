//! Specsheet Extraction Service
//!
//! Ingests supplier PDF datasheets: hybrid pattern/AI extraction,
//! reconciliation, and atomic persistence. One upload can carry many
//! files; each file succeeds or fails on its own.

use anyhow::Result;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use specsheet_database::{create_postgres_pool, run_postgres_migrations, DatasheetRepository};
use specsheet_models::DatasheetRecord;
use specsheet_utils::{init_logging, AppConfig, MistralClient, SpecsheetError};

mod ai_client;
mod batch;
mod patterns;
mod pdf_reader;
mod pipeline;
mod reconcile;

use ai_client::AiExtractor;
use batch::{process_batch, BatchSummary, FileStatus, PersistOutcome};
use pipeline::IntegratedExtractor;

#[derive(Clone)]
struct AppState {
    extractor: Arc<IntegratedExtractor>,
    datasheets: Arc<DatasheetRepository>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|_| AppConfig::default());
    init_logging(&config.logging)?;
    info!("Starting Specsheet Extraction Service");

    let pool = create_postgres_pool(&config.database.url, config.database.max_connections).await?;
    run_postgres_migrations(&pool).await?;

    let ai = if config.ai.is_enabled() {
        Some(AiExtractor::new(
            MistralClient::new(&config.ai)?,
            config.extraction.max_text_chars,
        ))
    } else {
        info!("No AI API key configured, running pattern-only");
        None
    };

    let state = AppState {
        extractor: Arc::new(IntegratedExtractor::new(ai, config.extraction.clone())),
        datasheets: Arc::new(DatasheetRepository::new(pool)),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/datasheets/upload", post(upload_datasheets))
        .route("/api/v1/datasheets", get(list_datasheets))
        .route("/api/v1/datasheets/:id", get(get_datasheet))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8081));
    let listener = TcpListener::bind(&addr).await?;
    info!("Extraction Service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "extraction",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Upload response: one entry per file, successes and failures side by side.
#[derive(Debug, Serialize)]
struct UploadResponse {
    total: usize,
    completed: usize,
    failed: usize,
    skipped: usize,
    files: BatchSummary,
}

/// Accepts one or many PDF files as multipart fields.
async fn upload_datasheets(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Upload error: {}", e)))?
    {
        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown.pdf".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Read error: {}", e)))?;
        files.push((file_name, data.to_vec()));
    }

    if files.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No files provided".to_string()));
    }

    let datasheets = state.datasheets.clone();
    let summary = process_batch(&state.extractor, files, |record, extraction| {
        let datasheets = datasheets.clone();
        async move {
            if let Some(existing) = datasheets.find_by_hash(&record.file_hash).await? {
                return Ok(PersistOutcome::Duplicate(existing));
            }
            let id = datasheets.insert_extraction(&record, &extraction).await?;
            Ok(PersistOutcome::Stored(id))
        }
    })
    .await;

    // Keep failed ingestions visible alongside successes.
    for outcome in &summary.outcomes {
        if outcome.status == FileStatus::Failed {
            let record = DatasheetRecord::failed(
                outcome.file_name.clone(),
                outcome.file_hash.clone(),
                outcome.error.clone().unwrap_or_default(),
            );
            if let Err(e) = state.datasheets.record_failure(&record).await {
                tracing::warn!(file = %outcome.file_name, error = %e, "Could not record failure");
            }
        }
    }

    Ok(Json(UploadResponse {
        total: summary.outcomes.len(),
        completed: summary.completed,
        failed: summary.failed,
        skipped: summary.skipped,
        files: summary,
    }))
}

async fn list_datasheets(
    State(state): State<AppState>,
) -> Result<Json<Vec<DatasheetRecord>>, (StatusCode, String)> {
    let records = state
        .datasheets
        .find_all()
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(records))
}

async fn get_datasheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DatasheetRecord>, (StatusCode, String)> {
    let record = state
        .datasheets
        .find_by_id(id)
        .await
        .map_err(|e| error_response(&e))?
        .ok_or((StatusCode::NOT_FOUND, "Datasheet not found".to_string()))?;
    Ok(Json(record))
}

fn error_response(error: &SpecsheetError) -> (StatusCode, String) {
    let status = StatusCode::from_u16(error.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, error.to_string())
}
