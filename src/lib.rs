pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod datetime;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber; RUST_LOG wins over the configured filter
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
