use std::sync::Arc;
use std::time::Duration;

use brainlit_admin::app::{app, AppState};
use brainlit_admin::backend::{MemoryBackend, PostgrestBackend, RegistrationBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL, ADMIN_PASSWORD, etc.
    let _ = dotenvy::dotenv();

    let config = brainlit_admin::config::config().clone();
    brainlit_admin::init_tracing(&config.api.log_filter);
    tracing::info!("Starting BrainLit admin in {:?} mode", config.environment);

    // --memory serves from an in-process backend, for local UI work
    let backend: Arc<dyn RegistrationBackend> = if std::env::args().any(|a| a == "--memory") {
        tracing::warn!("Using in-memory backend; nothing will be persisted");
        Arc::new(MemoryBackend::new())
    } else {
        Arc::new(PostgrestBackend::new(&config.backend)?)
    };

    if config.security.admin_password.is_empty() {
        tracing::warn!("ADMIN_PASSWORD is empty; admin login is disabled");
    }

    let port = config.api.port;
    let state = AppState::new(config, backend);
    state.sessions.clone().spawn_sweeper(Duration::from_secs(60));
    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("BrainLit admin listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
