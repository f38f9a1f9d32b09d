//! Runtime settings for reaching the prediction service.
//!
//! Precedence: command-line flag, then environment (a `.env` file is loaded
//! first), then the built-in default.

use std::time::Duration;

use reqwest::Url;

use crate::error::AppError;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/predict";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_ENDPOINT: &str = "PREDICTION_URL";
pub const ENV_TIMEOUT_SECS: &str = "PREDICTION_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Full URL the form POSTs to.
    pub endpoint: Url,
    pub timeout: Duration,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Resolve settings from flags and the process environment.
    pub fn resolve(overrides: &Overrides) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve using `lookup` in place of the process environment.
    pub fn resolve_with(
        overrides: &Overrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let raw_url = overrides
            .url
            .clone()
            .or_else(|| lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = parse_endpoint(raw_url.trim())?;

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => match lookup(ENV_TIMEOUT_SECS) {
                Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<u64>().map_err(|e| {
                    AppError::config(format!("Invalid {ENV_TIMEOUT_SECS} '{raw}': {e}"))
                })?,
                _ => DEFAULT_TIMEOUT_SECS,
            },
        };
        if timeout_secs == 0 {
            return Err(AppError::config("Timeout must be at least 1 second."));
        }

        Ok(Self {
            endpoint,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw)
        .map_err(|e| AppError::config(format!("Invalid prediction URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::config(format!(
            "Prediction URL must use http or https, got '{other}'."
        ))),
    }
}
