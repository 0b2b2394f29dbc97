//! Dashboard configuration: a TOML file plus environment overrides.

use crate::error::{ConfigError, CoreError};
use crate::types::PeriodDays;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

pub const CONFIG_PATH_ENV: &str = "INSIGHTS_DASHBOARD_CONFIG";
pub const API_URL_ENV: &str = "INSIGHTS_API_URL";
pub const SESSION_COOKIE_ENV: &str = "INSIGHTS_SESSION_COOKIE";
pub const DEFAULT_CONFIG_FILE: &str = "insights-dashboard.toml";

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_LOG_FILTER: &str =
    "insights_dashboard=info,gui=info,insights_workflow=info,insights_client=info";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub api_base_url: Url,
    /// Raw `Cookie` header value for the backend session, if any.
    pub session_cookie: Option<String>,
    pub user_agent: String,
    /// `None` leaves the transport defaults in place.
    pub request_timeout_secs: Option<u64>,
    pub default_period: PeriodDays,
    pub log_filter: String,
}

/// On-disk shape; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    api_base_url: Option<String>,
    session_cookie: Option<String>,
    user_agent: Option<String>,
    request_timeout_secs: Option<u64>,
    default_period_days: Option<u32>,
    log_filter: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default base URL is valid"),
            session_cookie: None,
            user_agent: format!("insights-dashboard/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: None,
            default_period: PeriodDays::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Resolves the config file location and applies environment overrides.
    pub fn load() -> Result<Self, CoreError> {
        let path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
                candidate.exists().then_some(candidate)
            }
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(SESSION_COOKIE_ENV).ok(),
        )?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::Config(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }),
            std::io::ErrorKind::PermissionDenied => {
                CoreError::Config(ConfigError::PermissionDenied {
                    path: path.display().to_string(),
                })
            }
            _ => CoreError::Io(e),
        })?;

        info!("Loading configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, CoreError> {
        let raw: RawConfig = toml::from_str(contents).map_err(ConfigError::from)?;
        let mut config = Self::default();

        if let Some(url) = raw.api_base_url {
            config.api_base_url = parse_base_url(&url)?;
        }
        config.session_cookie = raw.session_cookie.filter(|c| !c.trim().is_empty());
        if let Some(user_agent) = raw.user_agent {
            config.user_agent = user_agent;
        }
        config.request_timeout_secs = raw.request_timeout_secs.filter(|secs| *secs > 0);
        if let Some(days) = raw.default_period_days {
            config.default_period =
                PeriodDays::try_from(days).map_err(|_| ConfigError::InvalidValue {
                    field: "default_period_days".to_string(),
                    value: days.to_string(),
                })?;
        }
        if let Some(filter) = raw.log_filter {
            config.log_filter = filter;
        }

        Ok(config)
    }

    pub fn apply_overrides(
        &mut self,
        api_url: Option<String>,
        session_cookie: Option<String>,
    ) -> Result<(), CoreError> {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            debug!("Overriding API base URL from {}", API_URL_ENV);
            self.api_base_url = parse_base_url(&url)?;
        }
        if let Some(cookie) = session_cookie.filter(|c| !c.trim().is_empty()) {
            self.session_cookie = Some(cookie);
        }
        Ok(())
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|_| ConfigError::InvalidValue {
        field: "api_base_url".to_string(),
        value: value.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::InvalidValue {
            field: "api_base_url".to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:3000/");
        assert_eq!(config.default_period, PeriodDays::Week);
        assert!(config.session_cookie.is_none());
        assert!(config.request_timeout_secs.is_none());
    }

    #[test]
    fn test_from_toml() {
        let config = DashboardConfig::from_toml_str(
            r#"
            api_base_url = "https://dash.example.com"
            session_cookie = "sid=abc"
            default_period_days = 30
            request_timeout_secs = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url.host_str(), Some("dash.example.com"));
        assert_eq!(config.session_cookie.as_deref(), Some("sid=abc"));
        assert_eq!(config.default_period, PeriodDays::Month);
        assert!(config.request_timeout_secs.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = DashboardConfig::from_toml_str("default_period_days = 9").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "default_period_days"
        ));

        let err = DashboardConfig::from_toml_str(r#"api_base_url = "ftp://nope""#).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::InvalidValue { .. })));

        let err = DashboardConfig::from_toml_str("unknown_key = 1").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config = DashboardConfig::default();
        config
            .apply_overrides(
                Some("https://override.example.com".to_string()),
                Some(String::new()),
            )
            .unwrap();
        assert_eq!(config.api_base_url.host_str(), Some("override.example.com"));
        assert!(config.session_cookie.is_none());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"user_agent = "dash-test/1.0""#).unwrap();
        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.user_agent, "dash-test/1.0");

        let missing = DashboardConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(
            missing,
            Err(CoreError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
