use axum::{Json, http::StatusCode, http::Uri};
use serde_json::{Value, json};
use tracing::debug;

/// Public pages that reach the service are not rendered here. With a frontend
/// configured the access gate redirects them before they get this far.
pub async fn not_rendered(uri: Uri) -> (StatusCode, Json<Value>) {
    debug!(uri = %uri, "No route for public request");
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Not found" })),
    )
}
