//! ADR report submission and listing.

use adr_portal_core::models::{AdrReport, AdrReportInput};
use adr_portal_core::{drug_statistics, DrugStatistics, Validate};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::parse_id;
use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCreated {
    pub success: bool,
    pub message: &'static str,
    pub report_id: u64,
}

/// POST /api/adr
pub async fn submit_report(
    State(state): State<AppState>,
    payload: Result<Json<AdrReportInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ReportCreated>), ApiError> {
    let Json(input) = payload?;
    let report = input.validate()?;
    let created = state.store.create_adr_report(report);
    tracing::info!(
        id = created.id,
        serious = created.report.is_serious(),
        "[adr] report submitted"
    );
    Ok((
        StatusCode::CREATED,
        Json(ReportCreated {
            success: true,
            message: "ADR report submitted successfully",
            report_id: created.id,
        }),
    ))
}

/// GET /api/adr
pub async fn list_reports(State(state): State<AppState>) -> Json<Vec<AdrReport>> {
    Json(state.store.all_adr_reports())
}

/// GET /api/adr/:id
pub async fn get_report(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<AdrReport>, ApiError> {
    let id = parse_id(path, "Invalid report ID")?;
    state
        .store
        .get_adr_report(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Report not found".to_string()))
}

/// GET /api/adr/statistics
pub async fn report_statistics(State(state): State<AppState>) -> Json<Vec<DrugStatistics>> {
    Json(drug_statistics(&state.store.all_adr_reports()))
}
