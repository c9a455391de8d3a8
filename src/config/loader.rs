use std::{env, str::FromStr};

use chrono_tz::Tz;
use url::Url;

use super::env::{AppConfig, ConfigError, DirectoryConfig, GeminiConfig, LoggingConfig};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_base = var("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = Url::parse(raw_base.trim_end_matches('/')).map_err(|err| {
            ConfigError::Invalid {
                key: "GEMINI_API_BASE",
                value: raw_base.clone(),
                reason: err.to_string(),
            }
        })?;
        if !matches!(api_base.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "GEMINI_API_BASE",
                value: raw_base,
                reason: "scheme must be http or https".into(),
            });
        }

        let gemini = GeminiConfig {
            api_key: var("GEMINI_API_KEY"),
            model: var("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            api_base,
            temperature: parse_or("GEMINI_TEMPERATURE", var("GEMINI_TEMPERATURE"), 0.2)?,
            max_output_tokens: parse_or(
                "GEMINI_MAX_OUTPUT_TOKENS",
                var("GEMINI_MAX_OUTPUT_TOKENS"),
                1024,
            )?,
        };

        let directories = DirectoryConfig {
            logs_dir: var("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
            data_dir: var("DATA_DIR").unwrap_or_else(|| "data".to_string()),
            export_dir: var("EXPORT_DIR").unwrap_or_else(|| "exports".to_string()),
            history_filename: var("HISTORY_FILENAME")
                .unwrap_or_else(|| "email_classification_history.json".to_string()),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        let timezone = var("APP_TIMEZONE").unwrap_or_else(|| "UTC".to_string());
        if let Err(err) = timezone.parse::<Tz>() {
            return Err(ConfigError::Invalid {
                key: "APP_TIMEZONE",
                value: timezone,
                reason: err.to_string(),
            });
        }

        Ok(Self {
            gemini,
            directories,
            logging,
            timezone,
        })
    }

    /// Time zone used for the human-readable timestamps in history entries.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(err) => Err(ConfigError::Invalid {
                key,
                reason: err.to_string(),
                value,
            }),
        },
    }
}
