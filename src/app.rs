use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::backend::RegistrationBackend;
use crate::config::AppConfig;
use crate::handlers;
use crate::middleware::require_admin;
use crate::session::SessionStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: Arc<dyn RegistrationBackend>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: AppConfig, backend: Arc<dyn RegistrationBackend>) -> Self {
        let sessions = SessionStore::new(
            backend.clone(),
            config.dashboard.export_prefix.clone(),
            config.session_idle_timeout(),
        );
        Self {
            config: Arc::new(config),
            backend,
            sessions: Arc::new(sessions),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .merge(auth_public_routes())
        // Guarded dashboard
        .merge(admin_routes(state.clone()));

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security.cors_origins));
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/admin/login", get(auth::login_page).post(auth::login))
        .route("/admin/logout", post(auth::logout))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{dashboard, export, settings};

    Router::new()
        .route("/admin", get(dashboard::show))
        .route("/admin/refresh", post(dashboard::refresh))
        .route("/admin/home", get(dashboard::home))
        .route("/admin/settings", get(settings::show).put(settings::save))
        .route("/admin/export", get(export::download))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_app() -> Router {
        let mut config = AppConfig::development();
        config.api.enable_request_logging = false;
        app(AppState::new(config, Arc::new(MemoryBackend::new())))
    }

    #[tokio::test]
    async fn guarded_route_redirects_without_session() {
        let response = test_app()
            .oneshot(Request::builder().uri("/admin/export").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/admin/login");
    }

    #[tokio::test]
    async fn unknown_route_is_not_redirected() {
        let response = test_app()
            .oneshot(Request::builder().uri("/admin/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
