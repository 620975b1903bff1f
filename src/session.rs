//! Browser-session scoped key/value store.
//!
//! Each browser session gets a random id carried in a cookie without an
//! expiry, so it lasts until the browser session ends. The server side is
//! dropped on logout, once it has been idle longer than the configured
//! timeout, or when the process restarts. Nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::RegistrationBackend;
use crate::dashboard::Dashboard;

pub const SESSION_COOKIE: &str = "brainlit_session";

struct Session {
    values: HashMap<String, String>,
    dashboard: Option<Arc<Dashboard>>,
    last_seen: Instant,
}

impl Session {
    fn is_idle(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > idle_timeout
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    backend: Arc<dyn RegistrationBackend>,
    export_prefix: String,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(
        backend: Arc<dyn RegistrationBackend>,
        export_prefix: impl Into<String>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            backend,
            export_prefix: export_prefix.into(),
            idle_timeout,
        }
    }

    /// New session; idle sessions are swept first.
    pub async fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        Self::sweep(&mut sessions, self.idle_timeout);
        sessions.insert(
            id.clone(),
            Session {
                values: HashMap::new(),
                dashboard: None,
                last_seen: Instant::now(),
            },
        );
        debug!(session = %id, "Session created");
        id
    }

    /// Reads a value and marks the session as seen. An idle session reads
    /// as absent even before the next sweep removes it.
    pub async fn get(&self, id: &str, key: &str) -> Option<String> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        let now = Instant::now();
        if session.is_idle(now, self.idle_timeout) {
            return None;
        }
        session.last_seen = now;
        session.values.get(key).cloned()
    }

    /// Returns false when the session does not exist
    pub async fn set(&self, id: &str, key: &str, value: impl Into<String>) -> bool {
        match self.sessions.write().await.get_mut(id) {
            Some(session) => {
                session.values.insert(key.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: &str) {
        if self.sessions.write().await.remove(id).is_some() {
            debug!(session = %id, "Session removed");
        }
    }

    /// The session's dashboard, created on first use
    pub async fn dashboard(&self, id: &str) -> Option<Arc<Dashboard>> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        let dashboard = session.dashboard.get_or_insert_with(|| {
            Arc::new(Dashboard::new(self.backend.clone(), self.export_prefix.clone()))
        });
        Some(dashboard.clone())
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop every session idle for longer than the timeout; returns how many
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        Self::sweep(&mut sessions, self.idle_timeout)
    }

    fn sweep(sessions: &mut HashMap<String, Session>, idle_timeout: Duration) -> usize {
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle(now, idle_timeout));
        before - sessions.len()
    }

    /// Background sweep every `every`, for the lifetime of the server
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let evicted = self.evict_idle().await;
                if evicted > 0 {
                    info!(evicted, "Evicted idle sessions");
                }
            }
        })
    }
}

/// Session id from the request's Cookie header(s)
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Set-Cookie value for a session; no Max-Age, so the browser drops it at
/// the end of its session.
pub fn session_cookie(id: &str, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Strict", SESSION_COOKIE, id);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", SESSION_COOKIE)
}
