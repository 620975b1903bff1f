use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use super::{BackendError, Registration, RegistrationBackend, SettingsWrite, WebinarSettings};
use crate::config::BackendConfig;

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Client for the hosted database's REST interface (`/rest/v1`).
#[derive(Clone)]
pub struct PostgrestBackend {
    client: Client,
    rest_url: Url,
    api_key: String,
    registrations_table: String,
    settings_table: String,
}

impl PostgrestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base = Url::parse(&config.url)
            .map_err(|e| BackendError::Config(format!("invalid backend url {}: {}", config.url, e)))?;
        let rest_url = base
            .join("rest/v1/")
            .map_err(|e| BackendError::Config(e.to_string()))?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self {
            client,
            rest_url,
            api_key: config.api_key.clone(),
            registrations_table: config.registrations_table.clone(),
            settings_table: config.settings_table.clone(),
        })
    }

    fn table_url(&self, table: &str, query: &[(&str, &str)]) -> Result<Url, BackendError> {
        let mut url = self
            .rest_url
            .join(table)
            .map_err(|e| BackendError::Config(e.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body, status.canonical_reason().unwrap_or("request failed"));
        error!(status = status.as_u16(), %message, "backend request failed");
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        debug!(%url, "backend select");
        let response = self.send(self.client.get(url)).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Best human-readable message from a PostgREST error body
fn error_message(body: &str, fallback: &str) -> String {
    match serde_json::from_str::<PostgrestErrorBody>(body) {
        Ok(parsed) => {
            let mut message = parsed
                .message
                .or(parsed.details.clone())
                .unwrap_or_else(|| fallback.to_string());
            if let Some(hint) = parsed.hint.filter(|h| !h.is_empty()) {
                message = format!("{} ({})", message, hint);
            }
            if let Some(code) = parsed.code {
                debug!(%code, details = ?parsed.details, "postgrest error code");
            }
            message
        }
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => fallback.to_string(),
    }
}

#[async_trait]
impl RegistrationBackend for PostgrestBackend {
    async fn select_registrations(&self) -> Result<Vec<Registration>, BackendError> {
        let url = self.table_url(
            &self.registrations_table,
            &[("select", "*"), ("order", "registered_at.desc")],
        )?;
        self.fetch(url).await
    }

    async fn select_settings(&self) -> Result<Option<WebinarSettings>, BackendError> {
        let url = self.table_url(&self.settings_table, &[("select", "*"), ("limit", "1")])?;
        let rows: Vec<WebinarSettings> = self.fetch(url).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_settings(
        &self,
        id: &str,
        expected_updated_at: Option<&str>,
        fields: &SettingsWrite,
    ) -> Result<usize, BackendError> {
        let id_filter = format!("eq.{}", id);
        let version_filter = expected_updated_at.map(|v| format!("eq.{}", v));
        let mut query = vec![("id", id_filter.as_str())];
        if let Some(filter) = version_filter.as_deref() {
            query.push(("updated_at", filter));
        }
        let url = self.table_url(&self.settings_table, &query)?;

        debug!(%url, "backend update");
        let response = self
            .send(
                self.client
                    .patch(url)
                    .header("Prefer", "return=representation")
                    .json(fields),
            )
            .await?;
        let written: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(written.len())
    }

    async fn insert_settings(&self, fields: &SettingsWrite) -> Result<(), BackendError> {
        let url = self.table_url(&self.settings_table, &[])?;
        debug!(%url, "backend insert");
        self.send(
            self.client
                .post(url)
                .header("Prefer", "return=minimal")
                .json(fields),
        )
        .await?;
        Ok(())
    }
}
