// handlers/public/mod.rs - Public handlers (no session flag required)
//
// Security Level: None
// Route Prefix: / and /admin/login, /admin/logout

pub mod auth;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "BrainLit Admin",
            "version": version,
            "description": "Webinar registration dashboard",
            "endpoints": {
                "login": "/admin/login (public)",
                "dashboard": "/admin (session)",
                "refresh": "/admin/refresh (session)",
                "settings": "/admin/settings (session)",
                "export": "/admin/export (session)",
            }
        }
    }))
}

/// GET /health - liveness plus a settings read against the hosted database
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.backend.select_settings().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "backend": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "backend unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "backend_error": e.message()
                }
            })),
        ),
    }
}
