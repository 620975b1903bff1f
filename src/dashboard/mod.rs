//! Per-session registration dashboard: the registration list, the webinar
//! settings value and the operator notices, each held in its own container.

pub mod export;
pub mod notice;
pub mod registrations;
pub mod settings;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::backend::{Registration, RegistrationBackend};
use crate::datetime;

pub use export::{CsvExport, ExportError, CSV_CONTENT_TYPE, CSV_HEADERS};
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use registrations::{RegistrationState, RegistrationTrack};
pub use settings::{SaveError, SaveOutcome, SettingsState, SettingsTrack};

pub const EXPORTED_MESSAGE: &str = "CSV exported successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    Loading,
    Empty,
    Loaded,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRow {
    #[serde(flatten)]
    pub registration: Registration,
    pub registered_at_display: String,
}

/// What the dashboard renders: both slices plus the pending notices
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub status: ListStatus,
    pub loading: bool,
    pub total: usize,
    pub registrations: Vec<RegistrationRow>,
    pub webinar_date: String,
    pub webinar_date_display: Option<String>,
    pub saving: bool,
    pub notices: Vec<Notice>,
}

pub struct Dashboard {
    registrations: RegistrationTrack,
    settings: SettingsTrack,
    notices: NoticeBoard,
    export_prefix: String,
    mounted: AtomicBool,
}

impl Dashboard {
    pub fn new(backend: Arc<dyn RegistrationBackend>, export_prefix: impl Into<String>) -> Self {
        let notices = NoticeBoard::default();
        Self {
            registrations: RegistrationTrack::new(backend.clone(), notices.clone()),
            settings: SettingsTrack::new(backend, notices.clone()),
            notices,
            export_prefix: export_prefix.into(),
            mounted: AtomicBool::new(false),
        }
    }

    /// Page load: re-read both slices. The two reads are issued together
    /// and land in their own slice, so a failed settings read is retried by
    /// the next mount.
    pub async fn mount(&self, offset: FixedOffset) {
        info!("Mounting dashboard");
        self.mounted.store(true, Ordering::SeqCst);
        futures::join!(self.registrations.refresh(), self.settings.load(offset));
    }

    /// Mount unless a previous request already did
    pub async fn ensure_mounted(&self, offset: FixedOffset) {
        if !self.is_mounted() {
            self.mount(offset).await;
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Notices queued since the last drain
    pub fn take_notices(&self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub async fn refresh(&self) -> RegistrationState {
        self.registrations.refresh().await
    }

    pub async fn set_webinar_date(&self, value: impl Into<String>) {
        self.settings.set_webinar_date(value).await;
    }

    pub async fn save_settings(
        &self,
        typed: Option<String>,
        offset: FixedOffset,
    ) -> Result<SaveOutcome, SaveError> {
        self.settings.save(typed, offset).await
    }

    pub async fn registrations(&self) -> RegistrationState {
        self.registrations.current().await
    }

    pub async fn settings(&self) -> SettingsState {
        self.settings.current().await
    }

    /// Serialise the list held right now. Never re-queries the backend, so
    /// rows added since the last successful load are not included.
    pub async fn export_csv(&self, now: DateTime<Utc>) -> Result<CsvExport, ExportError> {
        let held = self.registrations.current().await;
        let content = export::registrations_csv(&held.registrations)?;
        let filename = export::export_filename(&self.export_prefix, now);
        info!(rows = held.registrations.len(), %filename, "Exported registrations");
        self.notices.success(EXPORTED_MESSAGE);
        Ok(CsvExport { filename, content })
    }

    /// Current view of both slices; drains pending notices.
    pub async fn snapshot(&self, offset: FixedOffset) -> DashboardSnapshot {
        let list = self.registrations.current().await;
        let settings = self.settings.current().await;

        let status = if list.loading {
            ListStatus::Loading
        } else if list.registrations.is_empty() {
            ListStatus::Empty
        } else {
            ListStatus::Loaded
        };

        let registrations = list
            .registrations
            .into_iter()
            .map(|registration| {
                let registered_at_display = match datetime::parse_instant(&registration.registered_at) {
                    Ok(instant) => datetime::display_short(instant, offset),
                    Err(e) => {
                        warn!(error = %e, id = %registration.id, "Unreadable registered_at");
                        registration.registered_at.clone()
                    }
                };
                RegistrationRow {
                    registration,
                    registered_at_display,
                }
            })
            .collect::<Vec<_>>();

        DashboardSnapshot {
            status,
            loading: list.loading,
            total: registrations.len(),
            registrations,
            webinar_date_display: datetime::display_long(&settings.webinar_date),
            webinar_date: settings.webinar_date,
            saving: settings.saving,
            notices: self.notices.drain(),
        }
    }
}
