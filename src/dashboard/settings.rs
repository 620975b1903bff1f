use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::notice::NoticeBoard;
use crate::backend::{BackendError, RegistrationBackend, SettingsWrite};
use crate::datetime::{self, DateError};

pub const EMPTY_DATE_MESSAGE: &str = "Please select a date and time";
pub const SAVED_MESSAGE: &str = "Webinar date updated successfully!";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsState {
    /// Editable value in the viewer's wall clock, `YYYY-MM-DDTHH:MM` or empty
    pub webinar_date: String,
    pub saving: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaveError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Date(#[from] DateError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Webinar settings were changed by another session, reload and try again")]
    Conflict,
}

/// Which write a save ended up issuing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Updated { id: String },
    Inserted,
}

/// Owns the webinar settings slice of a dashboard.
pub struct SettingsTrack {
    backend: Arc<dyn RegistrationBackend>,
    notices: NoticeBoard,
    state: Mutex<SettingsState>,
}

impl SettingsTrack {
    pub fn new(backend: Arc<dyn RegistrationBackend>, notices: NoticeBoard) -> Self {
        Self {
            backend,
            notices,
            state: Mutex::new(SettingsState::default()),
        }
    }

    /// Initialise the editable value from the stored row. Read failures are
    /// only logged and leave the value untouched.
    pub async fn load(&self, offset: FixedOffset) {
        let row = match self.backend.select_settings().await {
            Ok(Some(row)) => row,
            Ok(None) => {
                debug!("No webinar settings row yet");
                return;
            }
            Err(e) => {
                error!(error = %e, "Error fetching webinar settings");
                return;
            }
        };

        let Some(stored) = row.next_webinar_date.as_deref() else {
            return;
        };
        match datetime::parse_instant(stored) {
            Ok(instant) => {
                self.state.lock().await.webinar_date = datetime::to_local_input(instant, offset);
            }
            Err(e) => warn!(error = %e, id = %row.id, "Ignoring unreadable next_webinar_date"),
        }
    }

    pub async fn set_webinar_date(&self, value: impl Into<String>) {
        self.state.lock().await.webinar_date = value.into();
    }

    pub async fn current(&self) -> SettingsState {
        self.state.lock().await.clone()
    }

    /// Persist the editable value. `typed`, when given, replaces the held
    /// value first so that a failed save leaves it as the operator typed it.
    pub async fn save(
        &self,
        typed: Option<String>,
        offset: FixedOffset,
    ) -> Result<SaveOutcome, SaveError> {
        let value = {
            let mut state = self.state.lock().await;
            if let Some(typed) = typed {
                state.webinar_date = typed;
            }
            state.webinar_date.clone()
        };

        if value.trim().is_empty() {
            self.notices.error(EMPTY_DATE_MESSAGE);
            return Err(SaveError::Validation(EMPTY_DATE_MESSAGE.to_string()));
        }
        let instant = match datetime::from_local_input(&value, offset) {
            Ok(instant) => instant,
            Err(e) => {
                self.notices.error(format!("Failed to save webinar date: {}", e));
                return Err(e.into());
            }
        };

        self.state.lock().await.saving = true;
        let result = self.write(instant).await;
        self.state.lock().await.saving = false;

        match &result {
            Ok(outcome) => {
                info!(?outcome, next_webinar_date = %datetime::to_iso_millis(instant), "Saved webinar date");
                self.notices.success(SAVED_MESSAGE);
            }
            Err(e) => {
                error!(error = %e, "Error saving webinar date");
                self.notices.error(format!("Failed to save webinar date: {}", e));
            }
        }
        result
    }

    async fn write(&self, instant: chrono::DateTime<Utc>) -> Result<SaveOutcome, SaveError> {
        // A failed existence check is treated as "no row yet"
        let existing = match self.backend.select_settings().await {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Could not check for an existing settings row");
                None
            }
        };

        let fields = SettingsWrite {
            next_webinar_date: datetime::to_iso_millis(instant),
            updated_at: datetime::to_iso_millis(Utc::now()),
        };

        match existing {
            Some(row) => {
                let written = self
                    .backend
                    .update_settings(&row.id, row.updated_at.as_deref(), &fields)
                    .await?;
                if written == 0 {
                    return Err(SaveError::Conflict);
                }
                Ok(SaveOutcome::Updated { id: row.id })
            }
            None => {
                self.backend.insert_settings(&fields).await?;
                Ok(SaveOutcome::Inserted)
            }
        }
    }
}
