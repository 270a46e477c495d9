/// Configuration management for the Twiller service.
///
/// Loads configuration from environment variables. Nothing here is fatal
/// except an unparseable SMTP sender; missing settings fall back to local
/// development defaults and are logged best-effort at startup.
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// SMTP settings for verification / OTP / reset mail
    pub email: EmailConfig,
    /// Frontend base URL used to build verification and reset links
    pub frontend: FrontendConfig,
    /// SMS provider credentials (recognized, delivery is out of scope)
    pub sms: SmsConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP/WebSocket port
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// SMTP configuration. An empty host puts the mailer into no-op mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
}

/// Frontend base URL for link building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    pub base_url: String,
}

/// SMS provider credentials. Recognized and logged only; SMS delivery is
/// delegated and out of scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
}

impl SmsConfig {
    pub fn is_configured(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some() && self.from_number.is_some()
    }
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5001),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/twiller".to_string()),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_connections),
            min_connections: std::env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_min_connections),
        };

        let email = EmailConfig {
            smtp_host: std::env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(587),
            smtp_username: std::env::var("SMTP_USERNAME").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            smtp_from: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "Twiller <no-reply@twiller.local>".to_string()),
            use_starttls: std::env::var("SMTP_STARTTLS")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        };

        let frontend = FrontendConfig {
            base_url: std::env::var("FRONTEND_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        };

        let sms = SmsConfig {
            account_sid: std::env::var("SMS_ACCOUNT_SID").ok(),
            auth_token: std::env::var("SMS_AUTH_TOKEN").ok(),
            from_number: std::env::var("SMS_FROM_NUMBER").ok(),
        };

        Ok(Config {
            app,
            database,
            email,
            frontend,
            sms,
        })
    }

    /// Best-effort startup report of what is and is not configured.
    pub fn log_summary(&self) {
        tracing::info!(
            env = %self.app.env,
            host = %self.app.host,
            port = self.app.port,
            "Configuration loaded"
        );
        if self.email.smtp_host.is_empty() {
            tracing::warn!("SMTP not configured; outgoing mail will be logged only");
        }
        if !self.sms.is_configured() {
            tracing::info!("SMS provider not configured (delivery is delegated)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_values() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "PORT",
            "DATABASE_URL",
            "DB_MAX_CONNECTIONS",
            "DB_MIN_CONNECTIONS",
            "SMTP_HOST",
            "FRONTEND_BASE_URL",
        ] {
            std::env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.port, 5001);
        assert_eq!(config.database.url, "postgres://localhost:5432/twiller");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 5);
        assert!(config.email.smtp_host.is_empty());
        assert_eq!(config.frontend.base_url, "http://localhost:3000");
        assert!(!config.sms.is_configured());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("PORT", "8080");
        std::env::set_var("DATABASE_URL", "postgres://db/twiller");
        std::env::set_var("SMTP_HOST", "smtp.example.com");

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.port, 8080);
        assert_eq!(config.database.url, "postgres://db/twiller");
        assert_eq!(config.email.smtp_host, "smtp.example.com");

        std::env::remove_var("PORT");
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("SMTP_HOST");
    }
}
