use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::{error::ApiError, AppState};
use crate::domain::TrendPoint;

#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date: Option<String>,
}

/// Strict `YYYY-MM-DD`
fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub async fn data_handler(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<Response, ApiError> {
    if query.kind.as_deref() == Some("history") {
        let dates = state.service.history().await?;
        return Ok(Json(dates).into_response());
    }

    // `?date=` with no value means the same as leaving it out
    let date = match query.date.as_deref().filter(|d| !d.is_empty()) {
        Some(date) if query.kind.as_deref() != Some("latest") => date,
        _ => {
            let report = state.service.latest_report().await?;
            return Ok(Json(report).into_response());
        }
    };

    if parse_date(date).is_none() {
        return Err(ApiError::InvalidDate);
    }

    match state.service.report_for(date).await? {
        Some(report) => Ok(Json(report).into_response()),
        None => Err(ApiError::NotFound),
    }
}

pub async fn trends_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrendPoint>>, ApiError> {
    let today = Utc::now().date_naive();
    Ok(Json(state.service.trends(today).await?))
}

pub async fn crawl_handler(State(state): State<AppState>) -> Response {
    match state.service.crawl_and_store().await {
        Ok(stored) => Json(json!({
            "success": true,
            "date": stored.date,
            "report": stored.report,
        }))
        .into_response(),
        Err(e) => {
            error!("Crawl error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Failed to crawl Moltbook",
                })),
            )
                .into_response()
        }
    }
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
