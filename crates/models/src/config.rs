use std::str::FromStr;
use std::time::Duration;

use eyre::WrapErr;

use crate::AlgorithmVariant;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let non_blank = |key: &str| lookup(key).filter(|url| !url.trim().is_empty());
        let base_url = non_blank("MELODYMATCHR_API_URL")
            .or_else(|| non_blank("NEXT_PUBLIC_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout_secs = parse_or(&lookup, "MELODYMATCHR_REQUEST_TIMEOUT_SECS", 30u64)?;

        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Tuning for the incremental-search session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period after the last keystroke before suggestions are fetched.
    pub debounce: Duration,
    /// Trimmed query length below which no suggestion fetch is made.
    pub min_query_chars: usize,
    pub max_suggestions: usize,
    /// Number of ranked matches requested on commit.
    pub top_k: usize,
    pub algorithm: AlgorithmVariant,
}

impl SessionConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let defaults = Self::default();
        let debounce_ms = parse_or(
            &lookup,
            "MELODYMATCHR_DEBOUNCE_MS",
            defaults.debounce.as_millis() as u64,
        )?;

        Ok(Self {
            debounce: Duration::from_millis(debounce_ms),
            min_query_chars: parse_or(
                &lookup,
                "MELODYMATCHR_MIN_QUERY_CHARS",
                defaults.min_query_chars,
            )?,
            max_suggestions: parse_or(
                &lookup,
                "MELODYMATCHR_MAX_SUGGESTIONS",
                defaults.max_suggestions,
            )?,
            top_k: parse_or(&lookup, "MELODYMATCHR_TOP_K", defaults.top_k)?,
            algorithm: parse_or(&lookup, "MELODYMATCHR_ALGORITHM", defaults.algorithm)?,
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_chars: 2,
            max_suggestions: 5,
            top_k: 3,
            algorithm: AlgorithmVariant::Heap,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> eyre::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .wrap_err_with(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}
