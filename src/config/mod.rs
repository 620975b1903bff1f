use chrono::{FixedOffset, Offset, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub backend: BackendConfig,
    pub dashboard: DashboardConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL of the hosted database, e.g. https://xyz.supabase.co
    pub url: String,
    pub api_key: String,
    /// None leaves requests unbounded
    pub timeout_secs: Option<u64>,
    pub registrations_table: String,
    pub settings_table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Viewer offset used when the request carries no x-timezone-offset header
    pub default_offset_minutes: i32,
    pub export_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub log_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub cookie_secure: bool,
    /// Server-side sessions idle this long are dropped
    pub session_idle_minutes: u64,
    #[serde(skip_serializing)]
    pub admin_password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Backend overrides
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.backend.url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("SUPABASE_ANON_KEY") {
            self.backend.api_key = v;
        }
        if let Ok(v) = env::var("BACKEND_TIMEOUT_SECS") {
            self.backend.timeout_secs = v.parse().ok().filter(|secs| *secs > 0);
        }
        if let Ok(v) = env::var("BACKEND_REGISTRATIONS_TABLE") {
            self.backend.registrations_table = v;
        }
        if let Ok(v) = env::var("BACKEND_SETTINGS_TABLE") {
            self.backend.settings_table = v;
        }

        // Dashboard overrides
        if let Ok(v) = env::var("DASHBOARD_TZ_OFFSET_MINUTES") {
            self.dashboard.default_offset_minutes =
                v.parse().unwrap_or(self.dashboard.default_offset_minutes);
        }
        if let Ok(v) = env::var("DASHBOARD_EXPORT_PREFIX") {
            self.dashboard.export_prefix = v;
        }

        // API overrides
        if let Some(port) = env::var("BRAINLIT_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("LOG_FILTER") {
            self.api.log_filter = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }
        if let Ok(v) = env::var("SESSION_IDLE_MINUTES") {
            self.security.session_idle_minutes = v
                .parse()
                .ok()
                .filter(|minutes| *minutes > 0)
                .unwrap_or(self.security.session_idle_minutes);
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            self.security.admin_password = v;
        }

        self
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.security.session_idle_minutes.saturating_mul(60))
    }

    /// Viewer offset used when a request does not state its own
    pub fn default_offset(&self) -> FixedOffset {
        self.dashboard
            .default_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            backend: BackendConfig::defaults(),
            dashboard: DashboardConfig::defaults(),
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                log_filter: "brainlit_admin=debug,tower_http=debug".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                cookie_secure: false,
                session_idle_minutes: 60,
                admin_password: String::new(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            backend: BackendConfig::defaults(),
            dashboard: DashboardConfig::defaults(),
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                log_filter: "brainlit_admin=info,tower_http=info".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.brainlit.in".to_string()],
                cookie_secure: true,
                session_idle_minutes: 60,
                admin_password: String::new(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            backend: BackendConfig::defaults(),
            dashboard: DashboardConfig::defaults(),
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                log_filter: "brainlit_admin=info".to_string(),
            },
            security: SecurityConfig {
                enable_cors: false,
                cors_origins: vec!["https://brainlit.in".to_string()],
                cookie_secure: true,
                session_idle_minutes: 60,
                admin_password: String::new(),
            },
        }
    }
}

impl BackendConfig {
    fn defaults() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            timeout_secs: None,
            registrations_table: "registrations".to_string(),
            settings_table: "webinar_settings".to_string(),
        }
    }
}

impl DashboardConfig {
    fn defaults() -> Self {
        Self {
            // IST
            default_offset_minutes: 330,
            export_prefix: "brainlit-registrations".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
