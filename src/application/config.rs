use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
///
/// Constructed once in `main` and passed down explicitly; nothing in the
/// crate reads the environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Settings store
    pub settings_path: PathBuf,

    // Enrollment service (empty = not configured)
    pub enrollment_url: String,

    // Build info
    pub version: String,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            // Server
            host: env::var("KIOSKD_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("KIOSKD_API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8100),

            // Settings store
            settings_path: PathBuf::from(
                env::var("KIOSKD_SETTINGS_PATH")
                    .unwrap_or_else(|_| "/var/lib/kioskd/settings.json".to_string()),
            ),

            // Enrollment service
            enrollment_url: env::var("KIOSKD_ENROLLMENT_URL").unwrap_or_default(),

            // Build info
            version: env!("CARGO_PKG_VERSION").to_string(),

            // Logging
            log_level: env::var("KIOSKD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}
