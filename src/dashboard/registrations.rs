use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use super::notice::NoticeBoard;
use crate::backend::{Registration, RegistrationBackend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationState {
    pub loading: bool,
    pub registrations: Vec<Registration>,
}

impl Default for RegistrationState {
    fn default() -> Self {
        Self {
            loading: true,
            registrations: Vec::new(),
        }
    }
}

/// Owns the registration list slice of a dashboard.
///
/// Only [`RegistrationTrack::refresh`] writes the slice. A failed refresh
/// keeps whatever list was held before. Overlapping refreshes are not
/// cancelled, so the list ends up as whichever response completed last.
pub struct RegistrationTrack {
    backend: Arc<dyn RegistrationBackend>,
    notices: NoticeBoard,
    state: Mutex<RegistrationState>,
}

impl RegistrationTrack {
    pub fn new(backend: Arc<dyn RegistrationBackend>, notices: NoticeBoard) -> Self {
        Self {
            backend,
            notices,
            state: Mutex::new(RegistrationState::default()),
        }
    }

    pub async fn refresh(&self) -> RegistrationState {
        self.state.lock().await.loading = true;
        info!("Fetching registrations");

        let result = self.backend.select_registrations().await;

        let mut state = self.state.lock().await;
        match result {
            Ok(rows) => {
                info!(count = rows.len(), "Fetched registrations");
                if rows.is_empty() {
                    self.notices.info("No registrations found in database");
                }
                state.registrations = rows;
            }
            Err(e) => {
                error!(error = %e, "Error fetching registrations");
                self.notices
                    .error(format!("Failed to fetch registrations: {}", e.message()));
            }
        }
        state.loading = false;
        state.clone()
    }

    pub async fn current(&self) -> RegistrationState {
        self.state.lock().await.clone()
    }
}
