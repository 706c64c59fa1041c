// GET handlers: index, version

use axum::response::IntoResponse;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

/// GET /: plain-text banner with the page routes.
pub(super) async fn index_handler() -> impl IntoResponse {
    format!(
        "{} {}\n/api/systems\n/api/system/{{host}}/{{cpu|disk|interface|load|memory|vmem}}\n/data.csv/{{plugin}}/{{host}}\n",
        NAME, VERSION
    )
}

/// GET /version: service name and version, fixed at build time.
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}
