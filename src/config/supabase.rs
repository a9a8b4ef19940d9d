//! Supabase project configuration (auth + REST data access)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::environment::Environment;
use super::error::ValidationError;

/// Connection settings for the hosted identity provider and data store.
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL (e.g., "https://xyz.supabase.co")
    pub url: String,

    /// Public anon key sent as `apikey` on every request
    pub anon_key: SecretString,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Table holding one profile row per user
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,

    /// Table holding product ownership rows
    #[serde(default = "default_entitlements_table")]
    pub entitlements_table: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: SecretString::new(anon_key.into()),
            request_timeout_secs: default_request_timeout(),
            profiles_table: default_profiles_table(),
            entitlements_table: default_entitlements_table(),
        }
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate Supabase configuration
    ///
    /// In production, requires HTTPS for the project URL.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("SUPABASE__URL"));
        }
        if self.anon_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("SUPABASE__ANON_KEY"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl);
        }
        if environment.is_production() && !self.url.starts_with("https://") {
            return Err(ValidationError::UrlMustBeHttps);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.profiles_table.is_empty() {
            return Err(ValidationError::MissingRequired("SUPABASE__PROFILES_TABLE"));
        }
        if self.entitlements_table.is_empty() {
            return Err(ValidationError::MissingRequired("SUPABASE__ENTITLEMENTS_TABLE"));
        }
        Ok(())
    }
}

fn default_request_timeout() -> u64 {
    10
}

fn default_profiles_table() -> String {
    "profiles".to_string()
}

fn default_entitlements_table() -> String {
    "user_products".to_string()
}
