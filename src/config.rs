use crate::error::{GridError, Result};
use crate::locale::Locale;
use crate::server_data::FilterType;
use serde::Deserialize;
use std::path::Path;

/// Runtime settings of the grid server
///
/// Values come from an optional TOML file and are then overridden by the
/// `GRIDSERVE_*` environment variables.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
    /// Locale tag used for tables that do not name one
    pub default_locale: String,
    pub filter_type: FilterType,
    /// `env_logger` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Request parameter carrying the table id
    pub object_param: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:3000".to_string(),
            default_locale: "en-US".to_string(),
            filter_type: FilterType::AllTermsPerRow,
            log_filter: "info".to_string(),
            object_param: "object".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load the configuration
    ///
    /// # Arguments
    /// * `path` - Optional TOML file; defaults are used when absent
    ///
    /// # Returns
    /// * `Result<ServerConfig>` - The settings with environment overrides applied
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GridError::Config(e.to_string()))
    }

    /// Apply `GRIDSERVE_*` overrides looked up through `lookup`
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(bind) = lookup("GRIDSERVE_BIND") {
            self.bind = bind;
        }
        if let Some(locale) = lookup("GRIDSERVE_LOCALE") {
            self.default_locale = locale;
        }
        if let Some(filter_type) = lookup("GRIDSERVE_FILTER_TYPE") {
            self.filter_type = filter_type.parse().map_err(GridError::Config)?;
        }
        if let Some(log_filter) = lookup("GRIDSERVE_LOG") {
            self.log_filter = log_filter;
        }
        Ok(self)
    }

    pub fn locale(&self) -> Locale {
        Locale::parse(&self.default_locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.object_param, "object");
    }

    #[test]
    fn test_toml_and_overrides() {
        let config = ServerConfig::from_toml(
            r#"
            bind = "0.0.0.0:8080"
            filter_type = "any-term-per-row"
            default_locale = "de-DE"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.filter_type, FilterType::AnyTermPerRow);
        assert_eq!(config.locale().language(), "de");

        let env: HashMap<&str, &str> = [("GRIDSERVE_FILTER_TYPE", "all"), ("GRIDSERVE_LOG", "debug")]
            .into_iter()
            .collect();
        let config = config
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.filter_type, FilterType::AllTermsPerRow);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_bad_values() {
        assert!(ServerConfig::from_toml("filter_type = \"sometimes\"").is_err());
        let err = ServerConfig::default()
            .with_overrides(|key| (key == "GRIDSERVE_FILTER_TYPE").then(|| "never".to_string()))
            .unwrap_err();
        assert!(matches!(err, GridError::Config(_)));
    }
}
