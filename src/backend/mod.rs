//! Seam to the hosted database that owns registrations and settings.

pub mod memory;
pub mod postgrest;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub use memory::{BackendCall, MemoryBackend};
pub use postgrest::PostgrestBackend;

/// Errors from the backend collaborator, each carrying a human-readable message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid backend configuration: {0}")]
    Config(String),
}

impl BackendError {
    /// Message surfaced to the operator
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// One webinar registration, read-only to this service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(deserialize_with = "textual_id")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub parent_name: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub whatsapp: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub location: String,
    pub registered_at: String,
}

/// The conventional singleton settings row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebinarSettings {
    #[serde(deserialize_with = "textual_id")]
    pub id: String,
    #[serde(default)]
    pub next_webinar_date: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Field set written on save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsWrite {
    pub next_webinar_date: String,
    pub updated_at: String,
}

/// Query interface of the hosted database
#[async_trait]
pub trait RegistrationBackend: Send + Sync {
    /// All registrations, newest `registered_at` first
    async fn select_registrations(&self) -> Result<Vec<Registration>, BackendError>;

    /// At most one settings row
    async fn select_settings(&self) -> Result<Option<WebinarSettings>, BackendError>;

    /// Update the settings row with `id`. When `expected_updated_at` is given
    /// the row only matches if its `updated_at` still equals it. Returns the
    /// number of rows written.
    async fn update_settings(
        &self,
        id: &str,
        expected_updated_at: Option<&str>,
        fields: &SettingsWrite,
    ) -> Result<usize, BackendError>;

    async fn insert_settings(&self, fields: &SettingsWrite) -> Result<(), BackendError>;
}

/// Optional text columns come back as `null`; they are held as empty strings
fn nullable_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifiers arrive as integers (bigserial) or strings (uuid)
fn textual_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}
