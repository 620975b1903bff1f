#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{header, redirect, Client, StatusCode};

use brainlit_admin::app::{app, AppState};
use brainlit_admin::backend::{MemoryBackend, Registration, RegistrationBackend};
use brainlit_admin::config::AppConfig;

pub const ADMIN_PASSWORD: &str = "webinar-admin";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub backend: MemoryBackend,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.admin_password = ADMIN_PASSWORD.to_string();
    config.api.enable_request_logging = false;
    config.dashboard.default_offset_minutes = 330;
    config
}

/// Serve the app in-process on a free port, backed by `backend`
pub async fn spawn_server(backend: MemoryBackend) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let shared: Arc<dyn RegistrationBackend> = Arc::new(backend.clone());
    let router = app(AppState::new(test_config(), shared));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestServer {
        port,
        base_url,
        backend,
    })
}

/// Client that reports redirects instead of following them
pub fn client() -> Client {
    Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .expect("reqwest client")
}

/// Sign in and return the Cookie header value for the new session
pub async fn login(server: &TestServer) -> Result<String> {
    let res = client()
        .post(server.url("/admin/login"))
        .form(&[("password", ADMIN_PASSWORD)])
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::SEE_OTHER,
        "login failed with {}",
        res.status()
    );

    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .context("login did not set a cookie")?
        .to_str()?;
    let pair = set_cookie
        .split(';')
        .next()
        .context("malformed Set-Cookie")?;
    Ok(pair.to_string())
}

pub fn registration(id: &str, name: &str, registered_at: &str) -> Registration {
    Registration {
        id: id.to_string(),
        parent_name: name.to_string(),
        whatsapp: "+91 98450 00000".to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        location: "Mysuru".to_string(),
        registered_at: registered_at.to_string(),
    }
}
