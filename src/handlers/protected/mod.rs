// handlers/protected/mod.rs - Protected handlers (session flag required)
//
// Security Level: admin_authenticated == "true" in the caller's session
// Route Prefix: /admin/*
// Middleware: require_admin (redirects to /admin/login otherwise)

pub mod dashboard;
pub mod export;
pub mod settings;

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::FixedOffset;
use tracing::warn;

use crate::app::AppState;
use crate::dashboard::Dashboard;
use crate::datetime;
use crate::error::ApiError;
use crate::middleware::AdminSession;

/// Header carrying the viewer's offset in minutes east of UTC
pub const TIMEZONE_OFFSET_HEADER: &str = "x-timezone-offset";

/// Viewer's UTC offset, falling back to the configured default
pub fn viewer_offset(headers: &HeaderMap, state: &AppState) -> FixedOffset {
    let Some(raw) = headers
        .get(TIMEZONE_OFFSET_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        return state.config.default_offset();
    };

    datetime::offset_from_minutes(raw).unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring timezone offset header");
        state.config.default_offset()
    })
}

pub async fn session_dashboard(
    state: &AppState,
    session: &AdminSession,
) -> Result<Arc<Dashboard>, ApiError> {
    state
        .sessions
        .dashboard(&session.id)
        .await
        .ok_or_else(|| ApiError::unauthorized("Session has ended"))
}

/// The caller's dashboard, mounted if no page load has done so yet
pub async fn active_dashboard(
    state: &AppState,
    session: &AdminSession,
    offset: FixedOffset,
) -> Result<Arc<Dashboard>, ApiError> {
    let dashboard = session_dashboard(state, session).await?;
    dashboard.ensure_mounted(offset).await;
    Ok(dashboard)
}
