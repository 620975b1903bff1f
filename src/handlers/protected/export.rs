use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension,
};
use chrono::Utc;
use tracing::debug;

use super::{active_dashboard, viewer_offset};
use crate::app::AppState;
use crate::dashboard::CSV_CONTENT_TYPE;
use crate::error::ApiError;
use crate::middleware::AdminSession;

/// GET /admin/export - download the held registration list as CSV.
///
/// Serialises whatever the dashboard last loaded; the backend is not
/// queried again.
pub async fn download(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let offset = viewer_offset(&headers, &state);
    let dashboard = active_dashboard(&state, &session, offset).await?;
    let export = dashboard.export_csv(Utc::now()).await;
    // Notices raised by the export end with this response
    for notice in dashboard.take_notices() {
        debug!(level = ?notice.level, message = %notice.message, "Export notice");
    }
    let export = export?;

    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, export.content_disposition()),
        ],
        export.content,
    ))
}
