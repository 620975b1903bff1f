use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{BackendError, Registration, RegistrationBackend, SettingsWrite, WebinarSettings};

/// A backend request as observed by [`MemoryBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    SelectRegistrations,
    SelectSettings,
    UpdateSettings {
        id: String,
        expected_updated_at: Option<String>,
        fields: SettingsWrite,
    },
    InsertSettings {
        fields: SettingsWrite,
    },
}

impl BackendCall {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            BackendCall::UpdateSettings { .. } | BackendCall::InsertSettings { .. }
        )
    }
}

struct ScriptedListing {
    result: Result<Vec<Registration>, BackendError>,
    gate: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
struct Inner {
    registrations: Vec<Registration>,
    settings: Vec<WebinarSettings>,
    calls: Vec<BackendCall>,
    scripted: VecDeque<ScriptedListing>,
    registrations_error: Option<BackendError>,
    settings_read_error: Option<BackendError>,
    write_error: Option<BackendError>,
    next_settings_id: u64,
}

/// In-process backend holding tables in memory.
///
/// Serves the `--memory` server mode and tests. Every request is recorded
/// and failures can be injected per operation.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registrations(registrations: Vec<Registration>) -> Self {
        let backend = Self::new();
        backend.set_registrations(registrations);
        backend
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not wedge the others
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_registrations(&self, registrations: Vec<Registration>) {
        self.lock().registrations = registrations;
    }

    pub fn set_settings(&self, settings: Vec<WebinarSettings>) {
        self.lock().settings = settings;
    }

    pub fn settings_rows(&self) -> Vec<WebinarSettings> {
        self.lock().settings.clone()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn write_calls(&self) -> Vec<BackendCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.is_write())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn fail_registrations(&self, error: Option<BackendError>) {
        self.lock().registrations_error = error;
    }

    pub fn fail_settings_read(&self, error: Option<BackendError>) {
        self.lock().settings_read_error = error;
    }

    pub fn fail_writes(&self, error: Option<BackendError>) {
        self.lock().write_error = error;
    }

    /// Queue a one-off answer for the next registration listing. The call
    /// does not complete until the returned sender fires (or is dropped).
    pub fn script_registrations(
        &self,
        result: Result<Vec<Registration>, BackendError>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().scripted.push_back(ScriptedListing {
            result,
            gate: Some(rx),
        });
        tx
    }
}

#[async_trait]
impl RegistrationBackend for MemoryBackend {
    async fn select_registrations(&self) -> Result<Vec<Registration>, BackendError> {
        let scripted = {
            let mut inner = self.lock();
            inner.calls.push(BackendCall::SelectRegistrations);
            inner.scripted.pop_front()
        };

        if let Some(ScriptedListing { result, gate }) = scripted {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            return result;
        }

        let inner = self.lock();
        if let Some(err) = &inner.registrations_error {
            return Err(err.clone());
        }
        let mut rows = inner.registrations.clone();
        rows.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(rows)
    }

    async fn select_settings(&self) -> Result<Option<WebinarSettings>, BackendError> {
        let mut inner = self.lock();
        inner.calls.push(BackendCall::SelectSettings);
        if let Some(err) = &inner.settings_read_error {
            return Err(err.clone());
        }
        Ok(inner.settings.first().cloned())
    }

    async fn update_settings(
        &self,
        id: &str,
        expected_updated_at: Option<&str>,
        fields: &SettingsWrite,
    ) -> Result<usize, BackendError> {
        let mut inner = self.lock();
        inner.calls.push(BackendCall::UpdateSettings {
            id: id.to_string(),
            expected_updated_at: expected_updated_at.map(str::to_string),
            fields: fields.clone(),
        });
        if let Some(err) = &inner.write_error {
            return Err(err.clone());
        }

        let mut written = 0;
        for row in inner.settings.iter_mut().filter(|row| row.id == id) {
            if let Some(expected) = expected_updated_at {
                if row.updated_at.as_deref() != Some(expected) {
                    continue;
                }
            }
            row.next_webinar_date = Some(fields.next_webinar_date.clone());
            row.updated_at = Some(fields.updated_at.clone());
            written += 1;
        }
        Ok(written)
    }

    async fn insert_settings(&self, fields: &SettingsWrite) -> Result<(), BackendError> {
        let mut inner = self.lock();
        inner.calls.push(BackendCall::InsertSettings {
            fields: fields.clone(),
        });
        if let Some(err) = &inner.write_error {
            return Err(err.clone());
        }

        inner.next_settings_id += 1;
        let id = inner.next_settings_id.to_string();
        inner.settings.push(WebinarSettings {
            id,
            next_webinar_date: Some(fields.next_webinar_date.clone()),
            updated_at: Some(fields.updated_at.clone()),
        });
        Ok(())
    }
}
