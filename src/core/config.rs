//! Configuration management for the task server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables or defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Main configuration structure for the server.
///
/// This struct contains all configurable aspects of the server, organized
/// by concern for clarity and maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Credentials accepted by the authentication check.
    pub auth: AuthConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Authentication configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Basic-auth username.
    pub username: String,

    /// Basic-auth password.
    pub password: String,

    /// User id attached to the authenticated principal.
    pub user_id: String,

    /// Authorization header presented on behalf of STDIO/TCP sessions,
    /// which carry no per-request headers.
    pub session_authorization: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field(
                "session_authorization",
                &self.session_authorization.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // Demo credentials
            username: "demo".to_string(),
            password: "demo123".to_string(),
            user_id: "user-123".to_string(),
            session_authorization: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "Task Management MCP Server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        if let Ok(username) = std::env::var("MCP_AUTH_USERNAME") {
            config.auth.username = username;
        }

        if let Ok(password) = std::env::var("MCP_AUTH_PASSWORD") {
            config.auth.password = password;
            info!("Auth password loaded from environment");
        } else {
            warn!("Using default demo credentials. Set MCP_AUTH_USERNAME and MCP_AUTH_PASSWORD.");
        }

        if let Ok(authorization) = std::env::var("MCP_SESSION_AUTHORIZATION") {
            config.auth.session_authorization = Some(authorization);
            info!("Session authorization loaded for STDIO/TCP clients");
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_auth_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_AUTH_USERNAME", "alice");
            std::env::set_var("MCP_AUTH_PASSWORD", "s3cret");
            std::env::set_var("MCP_SESSION_AUTHORIZATION", "Basic YWxpY2U6czNjcmV0");
        }
        let config = Config::from_env();
        assert_eq!(config.auth.username, "alice");
        assert_eq!(config.auth.password, "s3cret");
        assert_eq!(
            config.auth.session_authorization.as_deref(),
            Some("Basic YWxpY2U6czNjcmV0")
        );
        unsafe {
            std::env::remove_var("MCP_AUTH_USERNAME");
            std::env::remove_var("MCP_AUTH_PASSWORD");
            std::env::remove_var("MCP_SESSION_AUTHORIZATION");
        }
    }

    #[test]
    fn test_auth_default_fallback() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::remove_var("MCP_AUTH_USERNAME");
            std::env::remove_var("MCP_AUTH_PASSWORD");
        }
        let config = Config::from_env();
        assert_eq!(config.auth.username, "demo");
        assert_eq!(config.auth.password, "demo123");
    }

    #[test]
    fn test_auth_redacted_in_debug() {
        let auth = AuthConfig {
            password: "super_secret_password".to_string(),
            session_authorization: Some("Basic c2VjcmV0".to_string()),
            ..Default::default()
        };
        let debug_str = format!("{:?}", auth);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_password"));
        assert!(!debug_str.contains("c2VjcmV0"));
    }
}
