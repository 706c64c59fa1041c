// Raw data: CSV export, schema browsing, chart URL building, collectd ingest.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiError;
use crate::csv_export::{CsvQuery, export_csv};
use crate::models::{ValueList, ValueListPayload};
use crate::selection::{SourceSelection, y_max};

/// GET /data.csv/{plugin}/{host}?type=&plugin_instance=&type_instance=&dsnames=&meta=&percentage=&time_range=
/// An empty body means nothing matched.
pub(super) async fn data_csv(
    State(state): State<AppState>,
    Path((plugin, host)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let query = CsvQuery::from_pairs(
        &plugin,
        &host,
        &pairs,
        state.config.charts.csv_time_range_hours,
    )
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let now_ms = chrono::Utc::now().timestamp_millis();
    let body = export_csv(&state.repo, &query, now_ms)
        .await?
        .unwrap_or_default();
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response())
}

/// GET /api/plugins
pub(super) async fn plugins(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.repo.list_plugins().await?))
}

/// GET /api/plugins/{plugin}/hosts
pub(super) async fn hosts(
    State(state): State<AppState>,
    Path(plugin): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.repo.list_hosts(&plugin).await?))
}

/// GET /api/plugins/{plugin}/plugin_instances
pub(super) async fn plugin_instances(
    State(state): State<AppState>,
    Path(plugin): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.repo.list_plugin_instances(&plugin).await?))
}

/// GET /api/plugins/{plugin}/types
pub(super) async fn types(
    State(state): State<AppState>,
    Path(plugin): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.repo.list_types(&plugin).await?))
}

/// GET /api/plugins/{plugin}/type_instances
pub(super) async fn type_instances(
    State(state): State<AppState>,
    Path(plugin): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.repo.list_type_instances(&plugin).await?))
}

/// GET /api/plugins/{plugin}/types/{type}/dsnames
pub(super) async fn dsnames(
    State(state): State<AppState>,
    Path((plugin, type_)): Path<(String, String)>,
) -> Result<Json<Vec<String>>, ApiError> {
    state
        .repo
        .get_dsnames(&plugin, &type_)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no data for {}/{}", plugin, type_)))
}

#[derive(Debug, Deserialize)]
pub(super) struct ChartUrlsRequest {
    #[serde(flatten)]
    selection: SourceSelection,
    /// URLs already on the chart; new ones are appended.
    #[serde(default)]
    urls: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChartUrlsResponse {
    urls: Vec<String>,
    y_max: Option<f64>,
}

/// POST /api/chart-urls: add a selection's data URLs to a chart.
pub(super) async fn chart_urls(
    Json(req): Json<ChartUrlsRequest>,
) -> Result<Json<ChartUrlsResponse>, ApiError> {
    let urls = req
        .selection
        .append_urls(&req.urls)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let y_max = y_max(&urls);
    Ok(Json(ChartUrlsResponse { urls, y_max }))
}

/// POST /api/values: collectd write_http JSON. The whole batch is rejected if any entry is invalid.
pub(super) async fn ingest_values(
    State(state): State<AppState>,
    Json(payloads): Json<Vec<ValueListPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let lists = payloads
        .into_iter()
        .map(ValueListPayload::into_value_list)
        .collect::<anyhow::Result<Vec<ValueList>>>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let accepted = lists.len();
    for vl in lists {
        state
            .write_tx
            .send(vl)
            .await
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("value writer stopped")))?;
    }
    tracing::debug!(accepted, "value lists queued");
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "accepted": accepted })),
    ))
}
