use std::str::FromStr;

use anyhow::{Context, Result};

use crate::interview::schema::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or a number is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Times a mandatory field is asked before it is force-skipped.
    pub mandatory_field_retries: u32,
    /// Times an optional field is asked before it is force-skipped.
    pub optional_field_retries: u32,
    /// Number of transcript turns handed to the language model as context.
    pub history_window: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            mandatory_field_retries: env_or("MANDATORY_FIELD_RETRIES", 2)?,
            optional_field_retries: env_or("OPTIONAL_FIELD_RETRIES", 1)?,
            history_window: env_or("HISTORY_WINDOW", 10)?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            mandatory: self.mandatory_field_retries.max(1),
            optional: self.optional_field_retries.max(1),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_or(key, std::env::var(key).ok(), default)
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{value}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_retries(mandatory: u32, optional: u32) -> Config {
        Config {
            database_url: "postgres://localhost/interview".to_string(),
            anthropic_api_key: "test-key".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            mandatory_field_retries: mandatory,
            optional_field_retries: optional,
            history_window: 10,
        }
    }

    #[test]
    fn test_parse_or_uses_default_when_unset() {
        let port: u16 = parse_or("PORT", None, 8080).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_or_parses_trimmed_value() {
        let retries: u32 = parse_or("MANDATORY_FIELD_RETRIES", Some(" 3 ".to_string()), 2).unwrap();
        assert_eq!(retries, 3);
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        let err = parse_or::<u16>("PORT", Some("eighty".to_string()), 8080).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_retry_policy_never_drops_below_one_ask() {
        let policy = config_with_retries(0, 0).retry_policy();
        assert_eq!(policy.mandatory, 1);
        assert_eq!(policy.optional, 1);
    }

    #[test]
    fn test_retry_policy_carries_configured_values() {
        let policy = config_with_retries(3, 2).retry_policy();
        assert_eq!(policy.mandatory, 3);
        assert_eq!(policy.optional, 2);
    }
}
