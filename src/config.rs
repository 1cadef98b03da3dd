//! Service configuration loaded from the environment.
//!
//! Durations accept plain seconds (`30`) or unit strings (`30s`, `5m`, `1h`).

use chrono_tz::Tz;
use figment::Figment;
use figment::providers::Env;
use fundu::DurationParser;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,
    /// Headless browser executable used for PDF conversion.
    #[serde(default = "default_chromium_path")]
    pub chromium_path: String,
    #[serde(
        default = "default_pdf_render_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub pdf_render_timeout: Duration,
    #[serde(default = "default_max_concurrent_renders")]
    pub max_concurrent_renders: usize,
    #[serde(
        default = "default_filter_cache_ttl",
        deserialize_with = "deserialize_duration"
    )]
    pub filter_cache_ttl: Duration,
    /// Timezone used for report dates and recency buckets.
    #[serde(
        default = "default_report_timezone",
        deserialize_with = "deserialize_timezone"
    )]
    pub report_timezone: Tz,
    /// Report renders allowed per client IP per minute.
    #[serde(default = "default_report_rate_limit")]
    pub report_rate_limit: u32,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::new().merge(Env::raw()).extract()
    }
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_chromium_path() -> String {
    "chromium".to_string()
}

fn default_pdf_render_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_concurrent_renders() -> usize {
    2
}

fn default_filter_cache_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_report_timezone() -> Tz {
    chrono_tz::America::Bogota
}

fn default_report_rate_limit() -> u32 {
    6
}

/// Parse a duration from either integer seconds or a unit-suffixed string.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if let Ok(secs) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    let parsed = DurationParser::with_all_time_units()
        .parse(trimmed)
        .map_err(|e| format!("invalid duration '{trimmed}': {e}"))?;
    parsed
        .try_into()
        .map_err(|e| format!("invalid duration '{trimmed}': {e}"))
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Seconds(u64),
        Text(String),
    }

    match RawDuration::deserialize(deserializer)? {
        RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawDuration::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

fn deserialize_timezone<'de, D>(deserializer: D) -> Result<Tz, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim()
        .parse::<Tz>()
        .map_err(|e| serde::de::Error::custom(format!("invalid timezone '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::Serialized;

    #[test]
    fn parse_duration_accepts_seconds_and_units() {
        assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration(" 1h ").unwrap(), Duration::from_secs(3600));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config: Config = Figment::new()
            .merge(Serialized::default("database_url", "postgres://localhost/icfes"))
            .extract()
            .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.pdf_render_timeout, Duration::from_secs(30));
        assert_eq!(config.max_concurrent_renders, 2);
        assert_eq!(config.report_timezone, chrono_tz::America::Bogota);
        assert_eq!(config.report_rate_limit, 6);
    }

    #[test]
    fn string_durations_and_timezone_are_parsed() {
        let config: Config = Figment::new()
            .merge(Serialized::default("database_url", "postgres://localhost/icfes"))
            .merge(Serialized::default("filter_cache_ttl", "90s"))
            .merge(Serialized::default("shutdown_timeout", 3))
            .merge(Serialized::default("report_timezone", "America/Lima"))
            .extract()
            .unwrap();
        assert_eq!(config.filter_cache_ttl, Duration::from_secs(90));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(3));
        assert_eq!(config.report_timezone, chrono_tz::America::Lima);
    }

    #[test]
    fn invalid_timezone_is_rejected() {
        let result: Result<Config, _> = Figment::new()
            .merge(Serialized::default("database_url", "postgres://localhost/icfes"))
            .merge(Serialized::default("report_timezone", "Mars/Olympus"))
            .extract();
        assert!(result.is_err());
    }
}
