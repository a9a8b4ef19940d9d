//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `MEMBER_PORTAL` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use member_portal::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Project at {}", config.supabase.url);
//! ```

mod environment;
mod error;
mod logging;
mod supabase;

pub use environment::Environment;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use supabase::SupabaseConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,

    /// Identity provider and data store
    pub supabase: SupabaseConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `MEMBER_PORTAL` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `MEMBER_PORTAL__SUPABASE__URL=...` -> `supabase.url = ...`
    /// - `MEMBER_PORTAL__LOGGING__JSON=true` -> `logging.json = true`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("MEMBER_PORTAL")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.supabase.validate(&self.environment)?;
        self.logging.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("MEMBER_PORTAL__SUPABASE__URL", "https://xyz.supabase.co");
        env::set_var("MEMBER_PORTAL__SUPABASE__ANON_KEY", "anon-key");
    }

    fn clear_env() {
        env::remove_var("MEMBER_PORTAL__SUPABASE__URL");
        env::remove_var("MEMBER_PORTAL__SUPABASE__ANON_KEY");
        env::remove_var("MEMBER_PORTAL__SUPABASE__REQUEST_TIMEOUT_SECS");
        env::remove_var("MEMBER_PORTAL__ENVIRONMENT");
        env::remove_var("MEMBER_PORTAL__LOGGING__JSON");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.supabase.url, "https://xyz.supabase.co");
        assert_eq!(config.supabase.anon_key.expose_secret(), "anon-key");
    }

    #[test]
    fn test_defaults_apply() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.supabase.request_timeout_secs, 10);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("MEMBER_PORTAL__ENVIRONMENT", "production");
        env::set_var("MEMBER_PORTAL__SUPABASE__REQUEST_TIMEOUT_SECS", "30");
        env::set_var("MEMBER_PORTAL__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert_eq!(config.supabase.request_timeout_secs, 30);
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_supabase_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load().is_err());
    }
}
