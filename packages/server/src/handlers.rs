//! HTTP handler functions for the StormEvents API.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use storm_api_query::FilterError;
use storm_api_query::filter::RawEventQuery;

use crate::AppState;
use crate::service::ServiceError;

/// Query parameters for the events and summary endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct EventQueryParams {
    /// Start date (`YYYY-MM-DD`).
    pub start: Option<String>,
    /// End date (`YYYY-MM-DD`).
    pub end: Option<String>,
    /// Bounding box as `minLon,minLat,maxLon,maxLat`.
    pub bbox: Option<String>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Column to group by (summary endpoint).
    pub groupby: Option<String>,
}

impl From<EventQueryParams> for RawEventQuery {
    fn from(p: EventQueryParams) -> Self {
        Self {
            start: p.start,
            end: p.end,
            bbox: p.bbox,
            limit: p.limit,
            groupby: p.groupby,
        }
    }
}

/// `GET /health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.service.health().await)
}

/// `GET /events`
///
/// Lists storm events filtered by date range and bounding box, newest
/// first.
pub async fn events(
    state: web::Data<AppState>,
    params: web::Query<EventQueryParams>,
) -> HttpResponse {
    let raw = RawEventQuery::from(params.into_inner());
    match state.service.list_events(&raw).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => error_response(&e),
    }
}

/// `GET /events/summary`
///
/// Counts filtered storm events per distinct value of the grouped column.
pub async fn events_summary(
    state: web::Data<AppState>,
    params: web::Query<EventQueryParams>,
) -> HttpResponse {
    let raw = RawEventQuery::from(params.into_inner());
    match state.service.summarize(&raw).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => error_response(&e),
    }
}

/// Maps a request failure onto the HTTP status taxonomy:
/// 400/422 for rejected input, 502 for failures reported by the cloud
/// query engine, 500 for local faults (missing data files, `DuckDB`
/// errors).
fn error_response(err: &ServiceError) -> HttpResponse {
    let status = match err {
        ServiceError::Filter(
            FilterError::BadBbox { .. } | FilterError::InvertedDateRange,
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Filter(_) => StatusCode::BAD_REQUEST,
        ServiceError::Backend(b) if b.is_upstream() => StatusCode::BAD_GATEWAY,
        ServiceError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        log::error!("Request failed: {err}");
    }

    HttpResponse::build(status).json(serde_json::json!({ "error": err.to_string() }))
}
