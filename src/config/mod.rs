//! Configuration module for the HangSmart backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Session lifetime in hours
    pub session_ttl_hours: i64,
    /// Chat-completion endpoint for recommendations
    pub chat_api_url: String,
    /// API key for the chat-completion endpoint
    pub chat_api_key: Option<String>,
    /// Model name sent to the chat-completion endpoint
    pub chat_model: String,
    /// Place-lookup-by-text-query endpoint
    pub places_api_url: String,
    /// API key for the place-lookup endpoint
    pub places_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("HANGSMART_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let bind_addr = env::var("HANGSMART_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid HANGSMART_BIND_ADDR format");

        let log_level = env::var("HANGSMART_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let session_ttl_hours = env::var("HANGSMART_SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(720);

        let chat_api_url = env::var("HANGSMART_CHAT_API_URL")
            .unwrap_or_else(|_| "https://api.perplexity.ai/chat/completions".to_string());
        let chat_api_key = env::var("HANGSMART_CHAT_API_KEY").ok();
        let chat_model = env::var("HANGSMART_CHAT_MODEL").unwrap_or_else(|_| "sonar".to_string());

        let places_api_url = env::var("HANGSMART_PLACES_API_URL").unwrap_or_else(|_| {
            "https://maps.googleapis.com/maps/api/place/findplacefromtext/json".to_string()
        });
        let places_api_key = env::var("HANGSMART_PLACES_API_KEY").ok();

        Self {
            db_path,
            bind_addr,
            log_level,
            session_ttl_hours,
            chat_api_url,
            chat_api_key,
            chat_model,
            places_api_url,
            places_api_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("HANGSMART_DB_PATH");
        env::remove_var("HANGSMART_BIND_ADDR");
        env::remove_var("HANGSMART_LOG_LEVEL");
        env::remove_var("HANGSMART_SESSION_TTL_HOURS");
        env::remove_var("HANGSMART_CHAT_API_URL");
        env::remove_var("HANGSMART_CHAT_API_KEY");
        env::remove_var("HANGSMART_CHAT_MODEL");
        env::remove_var("HANGSMART_PLACES_API_URL");
        env::remove_var("HANGSMART_PLACES_API_KEY");

        let config = Config::from_env();

        assert_eq!(config.db_path, PathBuf::from("./data/app.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.session_ttl_hours, 720);
        assert_eq!(config.chat_model, "sonar");
        assert!(config.chat_api_key.is_none());
        assert!(config.places_api_key.is_none());
    }
}
