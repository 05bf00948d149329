//! Runtime settings: an optional TOML file overlaid by environment variables.
//!
//! ```toml
//! database_url = "sqlite:///var/lib/signal_sync/warehouse.db"
//! target_timezone = "US/Central"
//! bind = "0.0.0.0:8080"
//!
//! [alphavantage]
//! requests_per_minute = 75
//! request_timeout_secs = 15
//! max_concurrent_requests = 1
//!
//! [views]
//! source_database_url = "/data/source.db"
//! target_database_url = "/data/target.db"
//! specific_views = ["v_daily_close"]
//! drop_existing = true
//!
//! [schedule]
//! views = "0 0 2 * * *"
//! ```
//!
//! Environment variables win over the file. The API key is normally supplied
//! through `ALPHAVANTAGE_API_KEY` and is only ever held as a [`SecretString`].

use std::{num::NonZeroU32, path::Path, time::Duration};

use chrono_tz::Tz;
use market_feeds::{
    providers::alpha_vantage::AlphaVantageConfig, strategies::news::DEFAULT_NEWS_ENDPOINT,
};
use secrecy::SecretString;
use serde::Deserialize;
use shared_utils::{
    config::ConfigError,
    env::{lookup_env_var, parse_flag, split_list},
};

pub const DEFAULT_TIMEZONE: &str = "US/Central";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_INGEST_CRON: &str = "0 */5 * * * *";
pub const DEFAULT_NEWS_CRON: &str = "0 */3 * * * *";
pub const DEFAULT_VIEWS_CRON: &str = "0 0 2 * * *";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSettings {
    database_url: Option<String>,
    target_timezone: Option<String>,
    bind: Option<String>,
    alphavantage: RawAlphaVantage,
    views: RawViews,
    schedule: RawSchedule,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawAlphaVantage {
    api_key: Option<String>,
    requests_per_minute: Option<u32>,
    request_timeout_secs: Option<u64>,
    max_concurrent_requests: Option<usize>,
    news_endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawViews {
    source_database_url: Option<String>,
    target_database_url: Option<String>,
    specific_views: Option<Vec<String>>,
    drop_existing: Option<bool>,
    create_schemas: Option<bool>,
    dry_run: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSchedule {
    enabled: Option<bool>,
    ingest: Option<String>,
    news: Option<String>,
    views: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ViewCopySettings {
    pub source_database_url: Option<String>,
    pub target_database_url: Option<String>,
    /// Empty means every view.
    pub specific_views: Vec<String>,
    pub drop_existing: bool,
    pub create_schemas: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub enabled: bool,
    pub ingest: String,
    pub news: String,
    pub views: String,
}

/// Shared read-only as `Arc<Settings>` by every job and trigger.
#[derive(Debug)]
pub struct Settings {
    pub database_url: Option<String>,
    api_key: Option<SecretString>,
    pub target_timezone: Tz,
    pub bind: String,
    pub alphavantage: AlphaVantageConfig,
    pub max_concurrent_requests: usize,
    pub news_endpoint: String,
    pub views: ViewCopySettings,
    pub schedule: ScheduleSettings,
}

impl Settings {
    /// Read `path` (if any) and overlay the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let toml = path
            .map(|p| {
                std::fs::read_to_string(p).map_err(|e| ConfigError::File {
                    path: p.display().to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;
        Self::from_parts(toml.as_deref(), lookup_env_var)
    }

    /// Build settings from file contents and an environment lookup.
    pub fn from_parts(
        toml: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw: RawSettings = match toml {
            Some(text) => toml::from_str(text).map_err(|e| ConfigError::File {
                path: "<settings>".to_string(),
                message: e.to_string(),
            })?,
            None => RawSettings::default(),
        };
        let flag = |key: &str, file: Option<bool>, default: bool| -> Result<bool, ConfigError> {
            match env(key) {
                Some(raw) => parse_flag(key, &raw),
                None => Ok(file.unwrap_or(default)),
            }
        };

        let tz_raw = env("TARGET_TIMEZONE")
            .or(raw.target_timezone)
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let target_timezone = tz_raw.trim().parse::<Tz>().map_err(|_| ConfigError::InvalidValue {
            key: "TARGET_TIMEZONE".to_string(),
            value: tz_raw.clone(),
            reason: "not an IANA time zone name".to_string(),
        })?;

        let av = raw.alphavantage;
        let defaults = AlphaVantageConfig::default();
        let requests_per_minute = match av.requests_per_minute {
            Some(n) => NonZeroU32::new(n).ok_or_else(|| ConfigError::InvalidValue {
                key: "alphavantage.requests_per_minute".to_string(),
                value: n.to_string(),
                reason: "must be positive".to_string(),
            })?,
            None => defaults.requests_per_minute,
        };
        let request_timeout = av
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let specific_views = match env("SPECIFIC_VIEWS") {
            Some(list) => split_list(&list),
            None => raw.views.specific_views.unwrap_or_default(),
        };

        Ok(Self {
            database_url: env("DATABASE_URL").or(raw.database_url),
            api_key: env("ALPHAVANTAGE_API_KEY")
                .or(av.api_key)
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            target_timezone,
            bind: env("SIGNAL_SYNC_BIND")
                .or(raw.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            alphavantage: AlphaVantageConfig {
                requests_per_minute,
                request_timeout,
            },
            max_concurrent_requests: av.max_concurrent_requests.unwrap_or(1).max(1),
            news_endpoint: av
                .news_endpoint
                .unwrap_or_else(|| DEFAULT_NEWS_ENDPOINT.to_string()),
            views: ViewCopySettings {
                source_database_url: env("SOURCE_DATABASE_URL").or(raw.views.source_database_url),
                target_database_url: env("TARGET_DATABASE_URL").or(raw.views.target_database_url),
                specific_views,
                drop_existing: flag("DROP_EXISTING_VIEWS", raw.views.drop_existing, true)?,
                create_schemas: flag("CREATE_SCHEMAS", raw.views.create_schemas, true)?,
                dry_run: flag("DRY_RUN", raw.views.dry_run, false)?,
            },
            schedule: ScheduleSettings {
                enabled: raw.schedule.enabled.unwrap_or(true),
                ingest: raw
                    .schedule
                    .ingest
                    .unwrap_or_else(|| DEFAULT_INGEST_CRON.to_string()),
                news: raw
                    .schedule
                    .news
                    .unwrap_or_else(|| DEFAULT_NEWS_CRON.to_string()),
                views: env("SYNC_SCHEDULE")
                    .or(raw.schedule.views)
                    .unwrap_or_else(|| DEFAULT_VIEWS_CRON.to_string()),
            },
        })
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingSetting("DATABASE_URL".to_string()))
    }

    pub fn api_key(&self) -> Result<&SecretString, ConfigError> {
        self.api_key
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSetting("ALPHAVANTAGE_API_KEY".to_string()))
    }
}

impl ViewCopySettings {
    pub fn source_url(&self) -> Result<&str, ConfigError> {
        self.source_database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingSetting("SOURCE_DATABASE_URL".to_string()))
    }

    pub fn target_url(&self) -> Result<&str, ConfigError> {
        self.target_database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingSetting("TARGET_DATABASE_URL".to_string()))
    }
}
