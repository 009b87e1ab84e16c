//! Environment-driven runtime configuration.
//!
//! # Invariants
//! - The REST backend is enabled only when both `SUPABASE_URL` and
//!   `SUPABASE_ANON_KEY` are set and non-blank.
//! - `log_dir` is absolute; `poll_interval` is non-zero.

use crate::integrations::supabase::SupabaseConfig;
use crate::logging::{default_log_level, parse_level};
use log::LevelFilter;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DB_PATH_KEY: &str = "RECONDESK_DB_PATH";
pub const LOG_LEVEL_KEY: &str = "RECONDESK_LOG_LEVEL";
pub const LOG_DIR_KEY: &str = "RECONDESK_LOG_DIR";
pub const SUPABASE_URL_KEY: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY_KEY: &str = "SUPABASE_ANON_KEY";
pub const DEPLOY_URL_KEY: &str = "RECONDESK_DEPLOY_URL";
pub const POLL_INTERVAL_KEY: &str = "RECONDESK_POLL_INTERVAL_SECS";

const DB_FILE_NAME: &str = "recondesk.sqlite3";
const LOG_DIR_NAME: &str = "recondesk-logs";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(String),
    InvalidPollInterval(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(value) => write!(
                f,
                "{LOG_LEVEL_KEY} must be one of off, error, warn, info, debug, trace; got `{value}`"
            ),
            Self::RelativeLogDir(value) => {
                write!(f, "{LOG_DIR_KEY} must be an absolute path, got `{value}`")
            }
            Self::InvalidPollInterval(value) => write!(
                f,
                "{POLL_INTERVAL_KEY} must be a positive number of seconds, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: LevelFilter,
    pub log_dir: PathBuf,
    pub supabase: Option<SupabaseConfig>,
    pub deploy_site_url: Option<String>,
    pub poll_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = get(DB_PATH_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME));

        let log_dir = match get(LOG_DIR_KEY) {
            Some(value) => {
                let path = PathBuf::from(&value);
                if !path.is_absolute() {
                    return Err(ConfigError::RelativeLogDir(value));
                }
                path
            }
            None => std::env::temp_dir().join(LOG_DIR_NAME),
        };

        let log_level = match get(LOG_LEVEL_KEY) {
            Some(value) => parse_level(&value).map_err(|_| ConfigError::InvalidLogLevel(value))?,
            None => default_log_level(),
        };

        let poll_interval = match get(POLL_INTERVAL_KEY) {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidPollInterval(value)),
            },
            None => DEFAULT_POLL_INTERVAL,
        };

        let supabase = match (get(SUPABASE_URL_KEY), get(SUPABASE_ANON_KEY_KEY)) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig::new(url, anon_key)),
            _ => None,
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
            supabase,
            deploy_site_url: get(DEPLOY_URL_KEY),
            poll_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, DEFAULT_POLL_INTERVAL};
    use std::collections::HashMap;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let values = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        AppConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert!(config.db_path.ends_with("recondesk.sqlite3"));
        assert!(config.log_dir.is_absolute());
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.supabase, None);
        assert_eq!(config.deploy_site_url, None);
    }

    #[test]
    fn supabase_requires_both_values() {
        let only_url = config_from(&[("SUPABASE_URL", "https://demo.supabase.co")]).unwrap();
        assert_eq!(only_url.supabase, None);

        let both = config_from(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap();
        let supabase = both.supabase.unwrap();
        assert_eq!(supabase.url, "https://demo.supabase.co");
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "   "),
            ("RECONDESK_DEPLOY_URL", ""),
        ])
        .unwrap();
        assert_eq!(config.supabase, None);
        assert_eq!(config.deploy_site_url, None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("RECONDESK_LOG_DIR", "logs")]).unwrap_err(),
            ConfigError::RelativeLogDir(_)
        ));
        assert!(matches!(
            config_from(&[("RECONDESK_LOG_LEVEL", "loud")]).unwrap_err(),
            ConfigError::InvalidLogLevel(_)
        ));
        assert!(matches!(
            config_from(&[("RECONDESK_POLL_INTERVAL_SECS", "0")]).unwrap_err(),
            ConfigError::InvalidPollInterval(_)
        ));
        let config = config_from(&[("RECONDESK_POLL_INTERVAL_SECS", "5")]).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }
}
