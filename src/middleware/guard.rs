use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::app::AppState;
use crate::session::session_id_from_headers;

/// Session key holding the admin flag
pub const AUTH_FLAG_KEY: &str = "admin_authenticated";

pub const LOGIN_PATH: &str = "/admin/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(&'static str),
}

/// Only the exact string "true" lets the caller through.
pub fn guard_decision(flag: Option<&str>) -> GuardDecision {
    match flag {
        Some("true") => GuardDecision::Render,
        _ => GuardDecision::Redirect(LOGIN_PATH),
    }
}

/// Session of a caller that passed the guard
#[derive(Clone, Debug)]
pub struct AdminSession {
    pub id: String,
}

/// Runs the protected handler, or answers with a 303 to the login page.
/// No expiry, no token validation, no backend round trip.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session_id = session_id_from_headers(request.headers());
    let flag = match &session_id {
        Some(id) => state.sessions.get(id, AUTH_FLAG_KEY).await,
        None => None,
    };

    let target = match (guard_decision(flag.as_deref()), session_id) {
        (GuardDecision::Render, Some(id)) => {
            request.extensions_mut().insert(AdminSession { id });
            return next.run(request).await;
        }
        (GuardDecision::Redirect(to), _) => to,
        (GuardDecision::Render, None) => LOGIN_PATH,
    };

    debug!(path = %request.uri().path(), "Unauthenticated request redirected to login");
    Redirect::to(target).into_response()
}
