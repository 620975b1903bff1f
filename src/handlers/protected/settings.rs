use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::{Deserialize, Serialize};

use super::{active_dashboard, viewer_offset};
use crate::app::AppState;
use crate::dashboard::{Notice, SaveOutcome};
use crate::datetime;
use crate::middleware::{AdminSession, ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct SaveSettingsRequest {
    /// `YYYY-MM-DDTHH:MM` in the viewer's wall clock; absent saves the held value
    #[serde(default)]
    pub webinar_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub webinar_date: String,
    pub webinar_date_display: Option<String>,
    pub saving: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<&'static str>,
    /// Notices raised by this save
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
}

/// GET /admin/settings
pub async fn show(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    headers: HeaderMap,
) -> ApiResult<SettingsView> {
    let offset = viewer_offset(&headers, &state);
    let dashboard = active_dashboard(&state, &session, offset).await?;
    let current = dashboard.settings().await;

    Ok(ApiResponse::success(SettingsView {
        webinar_date_display: datetime::display_long(&current.webinar_date),
        webinar_date: current.webinar_date,
        saving: current.saving,
        saved: None,
        notices: Vec::new(),
    }))
}

/// PUT /admin/settings - store the next webinar date.
///
/// Expected Input:
/// ```json
/// { "webinar_date": "2025-03-01T15:30" }
/// ```
///
/// An empty value is rejected before any backend call. Otherwise the
/// singleton row is re-read and updated by id, or inserted when missing.
pub async fn save(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    headers: HeaderMap,
    Json(payload): Json<SaveSettingsRequest>,
) -> ApiResult<SettingsView> {
    let offset = viewer_offset(&headers, &state);
    let dashboard = active_dashboard(&state, &session, offset).await?;

    let result = dashboard.save_settings(payload.webinar_date, offset).await;
    // The notices belong to this response; the error body carries the same message
    let notices = dashboard.take_notices();
    let outcome = result?;
    let current = dashboard.settings().await;

    let view = SettingsView {
        webinar_date_display: datetime::display_long(&current.webinar_date),
        webinar_date: current.webinar_date,
        saving: current.saving,
        saved: Some(match outcome {
            SaveOutcome::Updated { .. } => "updated",
            SaveOutcome::Inserted => "inserted",
        }),
        notices,
    };

    Ok(match outcome {
        SaveOutcome::Inserted => ApiResponse::created(view),
        SaveOutcome::Updated { .. } => ApiResponse::success(view),
    })
}
