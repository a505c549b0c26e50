//! Configuration module for the Habaru backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin login email
    pub admin_email: String,
    /// Admin login password (required for the admin area to be usable)
    pub admin_password: Option<String>,
    /// Admin display name
    pub admin_name: String,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Directory for uploaded post images
    pub uploads_dir: PathBuf,
    /// Path to the theme preference file
    pub prefs_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let admin_email =
            env::var("HABARU_ADMIN_EMAIL").unwrap_or_else(|_| "admin@habaru.media".to_string());

        let admin_password = env::var("HABARU_ADMIN_PASSWORD").ok();

        let admin_name =
            env::var("HABARU_ADMIN_NAME").unwrap_or_else(|_| "Habaru Admin".to_string());

        let db_path = env::var("HABARU_DB_PATH")
            .unwrap_or_else(|_| "./data/habaru.sqlite".to_string())
            .into();

        let uploads_dir = env::var("HABARU_UPLOADS_DIR")
            .unwrap_or_else(|_| "./data/uploads".to_string())
            .into();

        let prefs_path = env::var("HABARU_PREFS_PATH")
            .unwrap_or_else(|_| "./data/preferences.json".to_string())
            .into();

        let bind_addr = env::var("HABARU_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid HABARU_BIND_ADDR format");

        let log_level = env::var("HABARU_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            admin_email,
            admin_password,
            admin_name,
            db_path,
            uploads_dir,
            prefs_path,
            bind_addr,
            log_level,
        }
    }
}
