// Chart pages per host: /api/systems, /api/system/{host}/{page}

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;
use crate::charts::{ChartParams, pages};
use crate::models::SystemSummary;

#[derive(Debug, Deserialize)]
pub(super) struct WindowQuery {
    /// Seconds; defaults to charts.default_duration_secs.
    duration: Option<u64>,
    /// Epoch seconds; defaults to now.
    end: Option<i64>,
}

/// GET /api/systems: every host with its plugins, cores, disks and interfaces.
pub(super) async fn list_systems(
    State(state): State<AppState>,
) -> Result<Json<Vec<SystemSummary>>, ApiError> {
    Ok(Json(state.repo.list_systems().await?))
}

/// GET /api/systems/{host}
pub(super) async fn get_system(
    State(state): State<AppState>,
    Path(host): Path<String>,
) -> Result<Json<SystemSummary>, ApiError> {
    let system = find_system(&state, &host).await?;
    Ok(Json(system))
}

/// GET /api/system/{host}/{page}: charts keyed by instance name.
pub(super) async fn system_page(
    State(state): State<AppState>,
    Path((host, page)): Path<(String, String)>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let params = ChartParams::new(
        query
            .duration
            .unwrap_or(state.config.charts.default_duration_secs),
        query.end,
    );
    params
        .window()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let system = find_system(&state, &host).await?;
    let repo = state.repo.as_ref();
    let value = match page.as_str() {
        "cpu" => serde_json::to_value(pages::cpu_page(repo, &system, &params).await?),
        "disk" => serde_json::to_value(pages::disk_page(repo, &system, &params).await?),
        "interface" => serde_json::to_value(pages::interface_page(repo, &system, &params).await?),
        "load" => serde_json::to_value(pages::load_page(repo, &system, &params).await?),
        "memory" => serde_json::to_value(pages::memory_page(repo, &system, &params).await?),
        "vmem" => serde_json::to_value(pages::vmem_page(repo, &system, &params).await?),
        other => return Err(ApiError::NotFound(format!("unknown page: {}", other))),
    }
    .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(Json(value))
}

async fn find_system(state: &AppState, host: &str) -> Result<SystemSummary, ApiError> {
    state
        .repo
        .get_system(host)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("unknown host: {}", host)))
}
