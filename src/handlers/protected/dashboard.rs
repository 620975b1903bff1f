use axum::{
    extract::State,
    http::HeaderMap,
    response::Redirect,
    Extension,
};

use super::{session_dashboard, viewer_offset};
use crate::app::AppState;
use crate::dashboard::DashboardSnapshot;
use crate::middleware::{AdminSession, ApiResponse, ApiResult};

/// GET /admin - registrations, webinar date and pending notices.
///
/// Every page load mounts the dashboard again, re-reading the registration
/// list and the settings row together.
pub async fn show(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    headers: HeaderMap,
) -> ApiResult<DashboardSnapshot> {
    let offset = viewer_offset(&headers, &state);
    let dashboard = session_dashboard(&state, &session).await?;
    dashboard.mount(offset).await;
    Ok(ApiResponse::success(dashboard.snapshot(offset).await))
}

/// POST /admin/refresh - re-read the registration list
///
/// A failed read keeps the rows already held and reports the error as a
/// notice in the returned snapshot.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    headers: HeaderMap,
) -> ApiResult<DashboardSnapshot> {
    let offset = viewer_offset(&headers, &state);
    let dashboard = session_dashboard(&state, &session).await?;

    if dashboard.is_mounted() {
        dashboard.refresh().await;
    } else {
        dashboard.mount(offset).await;
    }
    Ok(ApiResponse::success(dashboard.snapshot(offset).await))
}

/// GET /admin/home - full redirect to the public site
pub async fn home() -> Redirect {
    Redirect::to("/")
}
