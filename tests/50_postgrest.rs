use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use brainlit_admin::backend::{BackendError, PostgrestBackend, RegistrationBackend, SettingsWrite};
use brainlit_admin::config::BackendConfig;

const API_KEY: &str = "anon-test-key";

#[derive(Debug, Clone)]
struct Recorded {
    method: &'static str,
    query: HashMap<String, String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct FakeRest {
    settings: Arc<Mutex<Vec<Value>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeRest {
    fn record(&self, method: &'static str, query: HashMap<String, String>, body: Option<Value>) {
        self.requests.lock().unwrap().push(Recorded { method, query, body });
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("apikey").map(|v| v == API_KEY).unwrap_or(false)
        && headers
            .get("authorization")
            .map(|v| v == format!("Bearer {}", API_KEY).as_str())
            .unwrap_or(false)
}

fn denied() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "code": "PGRST301", "message": "Invalid API key", "details": null, "hint": null })),
    )
        .into_response()
}

async fn registrations(
    State(fake): State<FakeRest>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return denied();
    }
    fake.record("GET", query, None);
    Json(json!([
        {
            "id": 2,
            "parent_name": "Arjun Mehta",
            "whatsapp": "+91 98450 00002",
            "email": "arjun@example.com",
            "location": "Pune",
            "registered_at": "2025-02-03T04:30:00.123456+00:00"
        },
        {
            "id": 1,
            "parent_name": "Lakshmi Iyer",
            "whatsapp": "+91 98450 00001",
            "email": "lakshmi@example.com",
            "location": "Chennai",
            "registered_at": "2025-02-01T04:30:00+00:00"
        }
    ]))
    .into_response()
}

async fn settings_get(
    State(fake): State<FakeRest>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return denied();
    }
    fake.record("GET", query, None);
    let rows = fake.settings.lock().unwrap().clone();
    Json(Value::Array(rows.into_iter().take(1).collect())).into_response()
}

async fn settings_patch(
    State(fake): State<FakeRest>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return denied();
    }
    fake.record("PATCH", query.clone(), Some(body.clone()));

    let id = query.get("id").cloned().unwrap_or_default();
    let version = query.get("updated_at").cloned();
    let mut rows = fake.settings.lock().unwrap();
    let mut written = Vec::new();
    for row in rows.iter_mut() {
        let id_matches = format!("eq.{}", row["id"]) == id;
        let version_matches = match &version {
            Some(v) => row["updated_at"].as_str().map(|u| format!("eq.{}", u)) == Some(v.clone()),
            None => true,
        };
        if id_matches && version_matches {
            row["next_webinar_date"] = body["next_webinar_date"].clone();
            row["updated_at"] = body["updated_at"].clone();
            written.push(row.clone());
        }
    }
    Json(Value::Array(written)).into_response()
}

async fn settings_post(
    State(fake): State<FakeRest>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return denied();
    }
    fake.record("POST", HashMap::new(), Some(body.clone()));
    let mut rows = fake.settings.lock().unwrap();
    let mut row = body;
    row["id"] = json!(rows.len() + 1);
    rows.push(row);
    StatusCode::CREATED.into_response()
}

async fn missing_table() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "code": "42P01",
            "message": "relation \"public.webinar_settingz\" does not exist",
            "details": null,
            "hint": null
        })),
    )
        .into_response()
}

async fn spawn_fake(fake: FakeRest) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let router = Router::new()
        .route("/rest/v1/registrations", get(registrations))
        .route(
            "/rest/v1/webinar_settings",
            get(settings_get).patch(settings_patch).post(settings_post),
        )
        .route("/rest/v1/webinar_settingz", get(missing_table))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

fn backend_config(url: &str, api_key: &str) -> BackendConfig {
    BackendConfig {
        url: url.to_string(),
        api_key: api_key.to_string(),
        timeout_secs: Some(5),
        registrations_table: "registrations".to_string(),
        settings_table: "webinar_settings".to_string(),
    }
}

fn write(date: &str) -> SettingsWrite {
    SettingsWrite {
        next_webinar_date: date.to_string(),
        updated_at: "2025-02-20T00:00:00.000Z".to_string(),
    }
}

#[tokio::test]
async fn lists_registrations_newest_first() -> Result<()> {
    let fake = FakeRest::default();
    let url = spawn_fake(fake.clone()).await?;
    let backend = PostgrestBackend::new(&backend_config(&url, API_KEY))?;

    let rows = backend.select_registrations().await?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "2");
    assert_eq!(rows[0].parent_name, "Arjun Mehta");

    let sent = fake.requests();
    assert_eq!(sent[0].query.get("select").map(String::as_str), Some("*"));
    assert_eq!(
        sent[0].query.get("order").map(String::as_str),
        Some("registered_at.desc")
    );
    Ok(())
}

#[tokio::test]
async fn bad_key_surfaces_backend_message() -> Result<()> {
    let url = spawn_fake(FakeRest::default()).await?;
    let backend = PostgrestBackend::new(&backend_config(&url, "wrong"))?;

    let err = backend.select_registrations().await.unwrap_err();
    assert_eq!(
        err,
        BackendError::Api {
            status: 401,
            message: "Invalid API key".to_string()
        }
    );
    Ok(())
}

#[tokio::test]
async fn settings_read_is_limited_to_one_row() -> Result<()> {
    let fake = FakeRest::default();
    *fake.settings.lock().unwrap() = vec![
        json!({ "id": 1, "next_webinar_date": "2025-03-01T10:00:00+00:00", "updated_at": "2025-01-01T00:00:00+00:00" }),
        json!({ "id": 2, "next_webinar_date": null, "updated_at": null }),
    ];
    let url = spawn_fake(fake.clone()).await?;
    let backend = PostgrestBackend::new(&backend_config(&url, API_KEY))?;

    let row = backend.select_settings().await?.context("expected a row")?;
    assert_eq!(row.id, "1");
    assert_eq!(fake.requests()[0].query.get("limit").map(String::as_str), Some("1"));
    Ok(())
}

#[tokio::test]
async fn no_settings_row_is_none() -> Result<()> {
    let url = spawn_fake(FakeRest::default()).await?;
    let backend = PostgrestBackend::new(&backend_config(&url, API_KEY))?;
    assert_eq!(backend.select_settings().await?, None);
    Ok(())
}

#[tokio::test]
async fn update_is_keyed_by_id_and_version() -> Result<()> {
    let fake = FakeRest::default();
    *fake.settings.lock().unwrap() = vec![json!({
        "id": 1,
        "next_webinar_date": "2025-03-01T10:00:00+00:00",
        "updated_at": "2025-01-01T00:00:00+00:00"
    })];
    let url = spawn_fake(fake.clone()).await?;
    let backend = PostgrestBackend::new(&backend_config(&url, API_KEY))?;

    let stale = backend
        .update_settings("1", Some("2024-12-31T00:00:00+00:00"), &write("2025-04-01T10:00:00.000Z"))
        .await?;
    assert_eq!(stale, 0);

    let written = backend
        .update_settings("1", Some("2025-01-01T00:00:00+00:00"), &write("2025-04-01T10:00:00.000Z"))
        .await?;
    assert_eq!(written, 1);

    let patch = fake
        .requests()
        .into_iter()
        .filter(|r| r.method == "PATCH")
        .last()
        .context("no PATCH sent")?;
    assert_eq!(patch.query.get("id").map(String::as_str), Some("eq.1"));
    assert_eq!(
        patch.body.as_ref().map(|b| b["next_webinar_date"].clone()),
        Some(json!("2025-04-01T10:00:00.000Z"))
    );
    Ok(())
}

#[tokio::test]
async fn insert_posts_field_set() -> Result<()> {
    let fake = FakeRest::default();
    let url = spawn_fake(fake.clone()).await?;
    let backend = PostgrestBackend::new(&backend_config(&url, API_KEY))?;

    backend.insert_settings(&write("2025-03-01T10:00:00.000Z")).await?;

    let post = fake
        .requests()
        .into_iter()
        .find(|r| r.method == "POST")
        .context("no POST sent")?;
    assert_eq!(
        post.body,
        Some(json!({
            "next_webinar_date": "2025-03-01T10:00:00.000Z",
            "updated_at": "2025-02-20T00:00:00.000Z"
        }))
    );
    assert_eq!(fake.settings.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_table_message_is_passed_through() -> Result<()> {
    let url = spawn_fake(FakeRest::default()).await?;
    let mut config = backend_config(&url, API_KEY);
    config.settings_table = "webinar_settingz".to_string();
    let backend = PostgrestBackend::new(&config)?;

    let err = backend.select_settings().await.unwrap_err();
    assert_eq!(
        err.message(),
        "relation \"public.webinar_settingz\" does not exist"
    );
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() -> Result<()> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let backend =
        PostgrestBackend::new(&backend_config(&format!("http://127.0.0.1:{}", port), API_KEY))?;

    let err = backend.select_registrations().await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)), "got {:?}", err);
    Ok(())
}
