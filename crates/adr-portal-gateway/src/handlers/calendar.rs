//! Deadline calendar endpoints.

use adr_portal_core::models::{CalendarEvent, CalendarEventInput};
use adr_portal_core::Validate;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::app::AppState;
use crate::error::ApiError;

const INVALID_ID: &str = "Invalid event ID";
const NOT_FOUND: &str = "Event not found";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCreated {
    pub success: bool,
    pub message: &'static str,
    pub event_id: u64,
}

#[derive(Debug, Serialize)]
pub struct EventDeleted {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
    pub limit: Option<String>,
}

/// GET /api/calendar
pub async fn list_events(State(state): State<AppState>) -> Json<Vec<CalendarEvent>> {
    Json(state.calendar.all())
}

/// GET /api/calendar/upcoming?limit=N
pub async fn upcoming_events(
    State(state): State<AppState>,
    query: Result<Query<UpcomingParams>, QueryRejection>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let invalid = || ApiError::BadRequest("Invalid limit".to_string());
    let Query(params) = query.map_err(|_| invalid())?;
    let limit = match params.limit.as_deref().map(str::trim) {
        None | Some("") => state.config.upcoming_default_limit,
        Some(raw) => raw.parse::<usize>().map_err(|_| invalid())?,
    };
    Ok(Json(state.calendar.upcoming(Utc::now(), limit)))
}

/// GET /api/calendar/:id
pub async fn get_event(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<CalendarEvent>, ApiError> {
    let id = parse_id(path, INVALID_ID)?;
    state
        .calendar
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))
}

/// POST /api/calendar
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<CalendarEventInput>, JsonRejection>,
) -> Result<(StatusCode, Json<EventCreated>), ApiError> {
    let Json(input) = payload?;
    let created = state.calendar.create(input.validate()?);
    Ok((
        StatusCode::CREATED,
        Json(EventCreated {
            success: true,
            message: "Calendar event created successfully",
            event_id: created.id,
        }),
    ))
}

/// DELETE /api/calendar/:id
pub async fn delete_event(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<EventDeleted>, ApiError> {
    let id = parse_id(path, INVALID_ID)?;
    if !state.calendar.delete(id) {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    Ok(Json(EventDeleted {
        success: true,
        message: "Event deleted successfully",
    }))
}
