// HTTP routes

mod charts;
mod data;
mod error;
mod http;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::models::ValueList;
use crate::value_repo::ValueRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) repo: Arc<ValueRepo>,
    pub(crate) write_tx: mpsc::Sender<ValueList>,
    pub(crate) config: AppConfig,
}

pub fn app(repo: Arc<ValueRepo>, write_tx: mpsc::Sender<ValueList>, config: AppConfig) -> Router {
    let state = AppState {
        repo,
        write_tx,
        config,
    };
    Router::new()
        .route("/", get(http::index_handler)) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/systems", get(charts::list_systems)) // GET /api/systems
        .route("/api/systems/{host}", get(charts::get_system)) // GET /api/systems/{host}
        .route("/api/system/{host}/{page}", get(charts::system_page)) // GET /api/system/{host}/cpu ...
        .route("/data.csv/{plugin}/{host}", get(data::data_csv)) // GET /data.csv/{plugin}/{host}
        .route("/api/plugins", get(data::plugins))
        .route("/api/plugins/{plugin}/hosts", get(data::hosts))
        .route("/api/plugins/{plugin}/plugin_instances", get(data::plugin_instances))
        .route("/api/plugins/{plugin}/types", get(data::types))
        .route("/api/plugins/{plugin}/type_instances", get(data::type_instances))
        .route("/api/plugins/{plugin}/types/{type}/dsnames", get(data::dsnames))
        .route("/api/chart-urls", post(data::chart_urls)) // POST /api/chart-urls
        .route("/api/values", post(data::ingest_values)) // POST /api/values
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
