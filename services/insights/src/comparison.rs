//! Cross-supplier comparison views.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;

use specsheet_database::{ComparisonRow, ParameterSummary};
use specsheet_models::ParameterKind;

use crate::{error_response, AppState};

/// One parameter across every supplier and part, in insertion order.
#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub parameter: String,
    pub category: String,
    pub rows: Vec<ComparisonRow>,
}

pub async fn compare_parameter(
    State(state): State<AppState>,
    Path(parameter): Path<String>,
) -> Result<Json<ComparisonResponse>, (StatusCode, String)> {
    let kind = ParameterKind::from_name(&parameter);
    let rows = state
        .parameters
        .comparison(&kind)
        .await
        .map_err(|e| error_response(&e))?;

    Ok(Json(ComparisonResponse {
        parameter: kind.name().to_string(),
        category: kind.category().as_str().to_string(),
        rows,
    }))
}

pub async fn list_parameters(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParameterSummary>>, (StatusCode, String)> {
    let summaries = state
        .parameters
        .unique_parameters()
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(summaries))
}

pub async fn list_suppliers(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let suppliers = state
        .parameters
        .suppliers()
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(suppliers))
}
