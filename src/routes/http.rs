// GET handlers: version, dashboard snapshot, topology, history report + CSV export

use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;

use super::AppState;
use crate::history::{self, HistoryFilter, HistoryReport, export};
use crate::models::HistoryRecord;
use crate::telemetry_repo::{TelemetryError, TelemetrySource};
use crate::version::{NAME, VERSION};

/// Handler errors rendered as JSON `{ "error": ... }`.
pub(super) enum ApiError {
    /// Telemetry source unreachable or returned garbage.
    Upstream(TelemetryError),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Upstream(e) => {
                tracing::warn!(error = %e, operation = "fetch_history", "history fetch failed");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "serving 500");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/dashboard: last published snapshot; never blocks on the poller.
pub(super) async fn dashboard_handler<S: TelemetrySource>(
    State(state): State<AppState<S>>,
) -> Response {
    let snapshot = state.snapshots.borrow().clone();
    axum::Json(snapshot.as_ref()).into_response()
}

/// GET /api/topology: static zone table.
pub(super) async fn topology_handler<S: TelemetrySource>(
    State(state): State<AppState<S>>,
) -> Response {
    axum::Json(state.topology.entries()).into_response()
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    node_id: Option<String>,
    search: Option<String>,
    /// RFC 3339, inclusive. Query strings are form-decoded, so a `+` offset must be sent
    /// as `%2B`; `Z` needs no escaping.
    from: Option<DateTime<Utc>>,
    /// Same format as `from`.
    to: Option<DateTime<Utc>>,
    /// Keep only the newest `limit` records of the source set before filtering.
    limit: Option<usize>,
    /// Export only: RFC 4180 quoting instead of the plain comma join.
    #[serde(default)]
    quoted: bool,
}

impl HistoryQuery {
    fn filter(&self) -> HistoryFilter {
        HistoryFilter {
            node_id: self.node_id.clone(),
            search: self.search.clone().filter(|s| !s.is_empty()),
            from: self.from,
            to: self.to,
        }
    }
}

async fn fetch_history<S: TelemetrySource>(
    state: &AppState<S>,
    query: &HistoryQuery,
) -> Result<Vec<HistoryRecord>, ApiError> {
    let records = state
        .source
        .node_history()
        .await
        .map_err(ApiError::Upstream)?;
    Ok(match query.limit {
        Some(limit) => history::latest(&records, limit).to_vec(),
        None => records,
    })
}

/// GET /api/history: filtered rows with status badges, summary, node selector ids.
/// `from`/`to` take RFC 3339 timestamps (`...Z`, or `%2B` for a `+` offset).
pub(super) async fn history_handler<S: TelemetrySource>(
    State(state): State<AppState<S>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let records = fetch_history(&state, &query).await?;
    let report = HistoryReport::build(&records, &query.filter(), &state.classifier);
    Ok(axum::Json(report).into_response())
}

/// GET /api/history/export: CSV download of the filtered rows.
pub(super) async fn export_handler<S: TelemetrySource>(
    State(state): State<AppState<S>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let records = fetch_history(&state, &query).await?;
    let filtered = history::filter(&records, &query.filter());
    let body = if query.quoted {
        export::to_csv_quoted(&filtered).map_err(ApiError::Internal)?
    } else {
        export::to_csv(&filtered)
    };
    let filename = export::export_filename(Local::now().date_naive());
    tracing::debug!(
        operation = "export_history",
        rows = filtered.len(),
        filename = %filename,
        "CSV export"
    );
    Ok((
        [
            (header::CONTENT_TYPE, export::CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}
