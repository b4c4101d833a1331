use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the Gemini endpoint.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl GeminiConfig {
    /// Reads `GEMINI_API_KEY` plus the optional `LINKLE_GEMINI_*` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let model = env::var("LINKLE_GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url =
            env::var("LINKLE_GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let request_timeout = match env::var("LINKLE_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            api_key,
            model,
            base_url,
            request_timeout,
        })
    }
}

/// Where the target list and flags live.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = env::var("LINKLE_DATA_DIR") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::data_dir()
        .map(|dir| dir.join("linkle"))
        .ok_or(ConfigError::NoDataDir)
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidValue {
        key: "LINKLE_REQUEST_TIMEOUT_SECS".to_string(),
        message: message.to_string(),
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number of seconds"))?;
    if secs == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_parses_whole_seconds() {
        assert_eq!(parse_timeout("15").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_timeout(" 3 ").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn timeout_rejects_zero_and_garbage() {
        assert!(matches!(
            parse_timeout("0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_timeout("ten"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
