//! Environment-sourced configuration.
//!
//! [`Config::from_lookup`] holds all parsing and defaulting; [`Config::from_env`]
//! is a thin wrapper over the process environment. The binary loads a `.env`
//! file before calling it.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::llm::{
    CompletionClient, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    HttpChatTransportBuilder, LlmError, RetryPolicy,
};
use crate::processor::BatchConfig;

pub const API_KEY_VAR: &str = "GROQ_API_KEY";
pub const BASE_URL_VAR: &str = "FEDA_LLM_BASE_URL";
pub const MODEL_VAR: &str = "FEDA_MODEL";
pub const TEMPERATURE_VAR: &str = "FEDA_TEMPERATURE";
pub const MAX_RETRIES_VAR: &str = "FEDA_MAX_RETRIES";
pub const BATCH_SIZE_VAR: &str = "FEDA_BATCH_SIZE";
pub const STORAGE_VAR: &str = "FEDA_STORAGE";
pub const DB_PATH_VAR: &str = "FEDA_DB_PATH";
pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_VAR: &str = "SUPABASE_KEY";
pub const SUPABASE_TABLE_VAR: &str = "FEDA_SUPABASE_TABLE";

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_SUPABASE_TABLE: &str = "processed_feedback";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which [`FeedbackStore`](crate::storage::FeedbackStore) implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    Memory,
    #[default]
    Sqlite,
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "supabase" => Ok(Self::Supabase),
            other => Err(format!(
                "unknown storage backend '{other}' (expected memory, sqlite or supabase)"
            )),
        }
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub llm_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_retries: u32,
    pub batch_size: usize,
    pub storage: StorageBackend,
    pub db_path: PathBuf,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub supabase_table: String,
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is set but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset. Credentials are not required here; they are
    /// checked when the component that needs them is built.
    ///
    /// # Examples
    ///
    /// ```
    /// use feda::config::{Config, StorageBackend};
    ///
    /// let config = Config::from_lookup(|key| match key {
    ///     "FEDA_STORAGE" => Some("memory".to_string()),
    ///     "FEDA_BATCH_SIZE" => Some("20".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(config.storage, StorageBackend::Memory);
    /// assert_eq!(config.batch_size, 20);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let temperature = parse_or(&get, TEMPERATURE_VAR, DEFAULT_TEMPERATURE)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(invalid(
                TEMPERATURE_VAR,
                temperature.to_string(),
                "must be between 0.0 and 2.0",
            ));
        }

        let max_retries = parse_or(&get, MAX_RETRIES_VAR, DEFAULT_MAX_RETRIES)?;
        if max_retries == 0 {
            return Err(invalid(MAX_RETRIES_VAR, "0".to_string(), "must be at least 1"));
        }

        let storage = match get(STORAGE_VAR) {
            Some(raw) => raw
                .parse::<StorageBackend>()
                .map_err(|reason: String| invalid(STORAGE_VAR, raw, &reason))?,
            None => StorageBackend::default(),
        };

        let db_path = match get(DB_PATH_VAR) {
            Some(path) => PathBuf::from(path),
            None => default_db_path(),
        };

        Ok(Self {
            api_key: get(API_KEY_VAR),
            llm_base_url: get(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
            max_retries,
            batch_size: parse_or(&get, BATCH_SIZE_VAR, BatchConfig::DEFAULT_SIZE)?,
            storage,
            db_path,
            supabase_url: get(SUPABASE_URL_VAR),
            supabase_key: get(SUPABASE_KEY_VAR),
            supabase_table: get(SUPABASE_TABLE_VAR)
                .unwrap_or_else(|| DEFAULT_SUPABASE_TABLE.to_string()),
        })
    }

    /// Builds the completion client described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` if no API key is configured, or
    /// `LlmError::InvalidUrl` for a malformed base URL.
    pub fn completion_client(&self) -> Result<CompletionClient, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let transport = HttpChatTransportBuilder::new()
            .base_url(&self.llm_base_url)
            .api_key(api_key)
            .build()?;

        Ok(CompletionClient::new(Arc::new(transport))
            .with_model(&self.model)
            .with_temperature(self.temperature)
            .with_retry_policy(RetryPolicy::with_max_attempts(self.max_retries)))
    }

    /// Supabase URL and key, both required for the Supabase backend.
    pub fn supabase_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let url = self
            .supabase_url
            .as_deref()
            .ok_or(ConfigError::Missing(SUPABASE_URL_VAR))?;
        let key = self
            .supabase_key
            .as_deref()
            .ok_or(ConfigError::Missing(SUPABASE_KEY_VAR))?;
        Ok((url, key))
    }
}

/// Gets the cross-platform database path.
///
/// Returns `{data_dir}/feda/feedback.db`, falling back to the working directory
/// when the platform has no data directory.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feda")
        .join("feedback.db")
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(key, raw, &e.to_string())),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: String, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value,
        reason: reason.to_string(),
    }
}
