mod common;

use anyhow::Result;
use brainlit_admin::backend::{BackendCall, BackendError, MemoryBackend, WebinarSettings};
use reqwest::{header, StatusCode};
use serde_json::Value;

use common::registration;

async fn get_json(server: &common::TestServer, cookie: &str, path: &str) -> Result<Value> {
    let res = common::client()
        .get(server.url(path))
        .header(header::COOKIE, cookie)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK, "GET {}", path);
    Ok(res.json().await?)
}

async fn post_json(server: &common::TestServer, cookie: &str, path: &str) -> Result<Value> {
    let res = common::client()
        .post(server.url(path))
        .header(header::COOKIE, cookie)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK, "POST {}", path);
    Ok(res.json().await?)
}

#[tokio::test]
async fn first_visit_loads_registrations_and_settings() -> Result<()> {
    let backend = MemoryBackend::with_registrations(vec![
        registration("1", "Lakshmi Iyer", "2025-02-01T04:30:00Z"),
        registration("2", "Arjun Mehta", "2025-02-03T04:30:00Z"),
    ]);
    backend.set_settings(vec![WebinarSettings {
        id: "1".into(),
        next_webinar_date: Some("2025-03-01T10:00:00.000Z".into()),
        updated_at: Some("2025-01-20T00:00:00.000Z".into()),
    }]);
    let server = common::spawn_server(backend).await?;
    let cookie = common::login(&server).await?;

    let body = get_json(&server, &cookie, "/admin").await?;
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["status"], "loaded");
    assert_eq!(data["total"], 2);
    assert_eq!(data["registrations"][0]["parent_name"], "Arjun Mehta");
    assert_eq!(data["registrations"][0]["registered_at_display"], "3 Feb 2025, 10:00 am");
    assert_eq!(data["webinar_date"], "2025-03-01T15:30");
    Ok(())
}

#[tokio::test]
async fn viewer_offset_header_changes_wall_clock() -> Result<()> {
    let backend = MemoryBackend::new();
    backend.set_settings(vec![WebinarSettings {
        id: "1".into(),
        next_webinar_date: Some("2025-03-01T10:00:00.000Z".into()),
        updated_at: None,
    }]);
    let server = common::spawn_server(backend).await?;
    let cookie = common::login(&server).await?;

    let res = common::client()
        .get(server.url("/admin/settings"))
        .header(header::COOKIE, &cookie)
        .header("x-timezone-offset", "-300")
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["webinar_date"], "2025-03-01T05:00");
    Ok(())
}

#[tokio::test]
async fn empty_table_reports_none_found() -> Result<()> {
    let server = common::spawn_server(MemoryBackend::new()).await?;
    let cookie = common::login(&server).await?;

    let body = get_json(&server, &cookie, "/admin").await?;
    assert_eq!(body["data"]["status"], "empty");
    assert_eq!(body["data"]["notices"][0]["level"], "info");
    assert_eq!(
        body["data"]["notices"][0]["message"],
        "No registrations found in database"
    );
    Ok(())
}

#[tokio::test]
async fn refresh_picks_up_new_rows() -> Result<()> {
    let server = common::spawn_server(MemoryBackend::with_registrations(vec![registration(
        "1",
        "Lakshmi Iyer",
        "2025-02-01T04:30:00Z",
    )]))
    .await?;
    let cookie = common::login(&server).await?;
    get_json(&server, &cookie, "/admin").await?;

    server.backend.set_registrations(vec![
        registration("1", "Lakshmi Iyer", "2025-02-01T04:30:00Z"),
        registration("2", "Arjun Mehta", "2025-02-03T04:30:00Z"),
    ]);
    let body = post_json(&server, &cookie, "/admin/refresh").await?;
    assert_eq!(body["data"]["total"], 2);
    Ok(())
}

#[tokio::test]
async fn failed_refresh_keeps_rows_and_reports_error() -> Result<()> {
    let server = common::spawn_server(MemoryBackend::with_registrations(vec![registration(
        "1",
        "Lakshmi Iyer",
        "2025-02-01T04:30:00Z",
    )]))
    .await?;
    let cookie = common::login(&server).await?;
    get_json(&server, &cookie, "/admin").await?;

    server.backend.fail_registrations(Some(BackendError::Api {
        status: 500,
        message: "canceling statement due to statement timeout".into(),
    }));
    let body = post_json(&server, &cookie, "/admin/refresh").await?;

    let data = &body["data"];
    assert_eq!(data["total"], 1);
    assert_eq!(data["loading"], false);
    assert_eq!(data["notices"][0]["level"], "error");
    assert_eq!(
        data["notices"][0]["message"],
        "Failed to fetch registrations: canceling statement due to statement timeout"
    );
    Ok(())
}

#[tokio::test]
async fn reload_retries_failed_settings_read() -> Result<()> {
    let backend = MemoryBackend::new();
    backend.set_settings(vec![WebinarSettings {
        id: "1".into(),
        next_webinar_date: Some("2025-03-01T10:00:00.000Z".into()),
        updated_at: None,
    }]);
    backend.fail_settings_read(Some(BackendError::Transport("connection reset".into())));
    let server = common::spawn_server(backend).await?;
    let cookie = common::login(&server).await?;

    let body = get_json(&server, &cookie, "/admin").await?;
    assert_eq!(body["data"]["webinar_date"], "");

    server.backend.fail_settings_read(None);
    server.backend.clear_calls();
    let body = get_json(&server, &cookie, "/admin").await?;
    assert_eq!(body["data"]["webinar_date"], "2025-03-01T15:30");

    let body = get_json(&server, &cookie, "/admin/settings").await?;
    assert_eq!(body["data"]["webinar_date"], "2025-03-01T15:30");

    let calls = server.backend.calls();
    assert!(calls.contains(&BackendCall::SelectRegistrations));
    assert!(calls.contains(&BackendCall::SelectSettings));
    Ok(())
}

#[tokio::test]
async fn reload_shows_current_table() -> Result<()> {
    let server = common::spawn_server(MemoryBackend::with_registrations(vec![registration(
        "1",
        "Lakshmi Iyer",
        "2025-02-01T04:30:00Z",
    )]))
    .await?;
    let first = common::login(&server).await?;
    let second = common::login(&server).await?;
    assert_ne!(first, second);

    let body = get_json(&server, &first, "/admin").await?;
    assert_eq!(body["data"]["total"], 1);
    server.backend.set_registrations(Vec::new());

    let body = get_json(&server, &second, "/admin").await?;
    assert_eq!(body["data"]["total"], 0);
    let body = get_json(&server, &first, "/admin").await?;
    assert_eq!(body["data"]["total"], 0);
    Ok(())
}
