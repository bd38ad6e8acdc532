pub mod adr;
pub mod calendar;
pub mod chat;

use axum::extract::rejection::PathRejection;
use axum::extract::Path;

use crate::error::ApiError;

pub async fn health() -> &'static str {
    "OK"
}

/// Integer path id, or 400 with `invalid` as the message.
pub(crate) fn parse_id(
    path: Result<Path<String>, PathRejection>,
    invalid: &str,
) -> Result<u64, ApiError> {
    path.ok()
        .and_then(|Path(raw)| raw.trim().parse::<u64>().ok())
        .ok_or_else(|| ApiError::BadRequest(invalid.to_string()))
}
