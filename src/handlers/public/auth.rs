use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::app::AppState;
use crate::middleware::{AUTH_FLAG_KEY, LOGIN_PATH};
use crate::session::{expired_session_cookie, session_cookie, session_id_from_headers};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub password: String,
}

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="robots" content="noindex, nofollow">
<title>Admin Login - BrainLit</title>
</head>
<body>
<form method="post" action="/admin/login">
<label for="password">Admin password</label>
<input id="password" name="password" type="password" autofocus>
<button type="submit">Sign in</button>
</form>
{error}
</body>
</html>
"#;

fn render_login(error: Option<&str>) -> Html<String> {
    let error = error
        .map(|msg| format!("<p role=\"alert\">{}</p>", msg))
        .unwrap_or_default();
    Html(LOGIN_PAGE.replace("{error}", &error))
}

/// GET /admin/login
pub async fn login_page() -> Html<String> {
    render_login(None)
}

/// POST /admin/login - sets the session flag the dashboard guard checks
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let expected = &state.config.security.admin_password;
    if expected.is_empty() {
        warn!("Login attempted but ADMIN_PASSWORD is not configured");
        return (
            StatusCode::UNAUTHORIZED,
            render_login(Some("Admin login is not configured")),
        )
            .into_response();
    }
    if form.password != *expected {
        warn!("Rejected admin login");
        return (
            StatusCode::UNAUTHORIZED,
            render_login(Some("Invalid password")),
        )
            .into_response();
    }

    let id = state.sessions.create().await;
    state.sessions.set(&id, AUTH_FLAG_KEY, "true").await;
    info!(session = %id, "Admin signed in");

    (
        [(
            header::SET_COOKIE,
            session_cookie(&id, state.config.security.cookie_secure),
        )],
        Redirect::to("/admin"),
    )
        .into_response()
}

/// POST /admin/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_id_from_headers(&headers) {
        state.sessions.remove(&id).await;
        info!(session = %id, "Admin signed out");
    }

    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}
