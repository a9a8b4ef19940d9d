//! Logging configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Log output settings. `RUST_LOG`, when set, overrides `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive (e.g., "info" or "info,member_portal=debug")
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.level.trim().is_empty() {
            return Err(ValidationError::MissingRequired("LOGGING__LEVEL"));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_level_is_rejected() {
        let config = LoggingConfig {
            level: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
