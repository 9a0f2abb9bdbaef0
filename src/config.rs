use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_VISION_API_URL: &str = "https://vision.googleapis.com";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    pub vision_api_key: String,
    pub vision_api_url: String,
    pub gemini_api_key: String,
    pub gemini_api_url: String,
    pub gemini_model: String,
    pub allowed_origins: Vec<String>,
    pub bind_addr: String,
    pub port: u16,
    pub upstream_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Config {
    /// Read configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let vision_api_key = get("VISION_API_KEY").context("VISION_API_KEY must be set")?;
        let gemini_api_key = get("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {}", raw))?,
            None => 8080,
        };

        let timeout_secs = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("UPSTREAM_TIMEOUT_SECS is not a number: {}", raw))?,
            None => 60,
        };
        if timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be greater than zero");
        }

        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("MAX_BODY_BYTES is not a number: {}", raw))?,
            None => 10 * 1024 * 1024,
        };

        let origins = get("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());

        Ok(Self {
            vision_api_key,
            vision_api_url: trim_base(get("VISION_API_URL").as_deref().unwrap_or(DEFAULT_VISION_API_URL)),
            gemini_api_key,
            gemini_api_url: trim_base(get("GEMINI_API_URL").as_deref().unwrap_or(DEFAULT_GEMINI_API_URL)),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            allowed_origins: parse_origins(&origins),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            upstream_timeout: Duration::from_secs(timeout_secs),
            max_body_bytes,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("VISION_API_KEY", "v-key"),
            ("GEMINI_API_KEY", "g-key"),
        ]))
        .unwrap();

        assert_eq!(config.vision_api_url, DEFAULT_VISION_API_URL);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.port, 8080);
        assert_eq!(config.upstream_timeout, Duration::from_secs(60));
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_keys_fail() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g-key")])).unwrap_err();
        assert!(err.to_string().contains("VISION_API_KEY"));

        let err = Config::from_lookup(lookup(&[
            ("VISION_API_KEY", "v-key"),
            ("GEMINI_API_KEY", "  "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("VISION_API_KEY", "v-key"),
            ("GEMINI_API_KEY", "g-key"),
            ("VISION_API_URL", "http://127.0.0.1:9000/"),
            ("PORT", "9090"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
            ("ALLOWED_ORIGINS", "https://app.example.com/, ,https://admin.example.com"),
        ]))
        .unwrap();

        assert_eq!(config.vision_api_url, "http://127.0.0.1:9000");
        assert_eq!(config.port, 9090);
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
        assert_eq!(
            config.allowed_origins,
            vec!["https://app.example.com", "https://admin.example.com"]
        );
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let result = Config::from_lookup(lookup(&[
            ("VISION_API_KEY", "v-key"),
            ("GEMINI_API_KEY", "g-key"),
            ("PORT", "eighty"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_is_an_error() {
        let err = Config::from_lookup(lookup(&[
            ("VISION_API_KEY", "v-key"),
            ("GEMINI_API_KEY", "g-key"),
            ("UPSTREAM_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("UPSTREAM_TIMEOUT_SECS"));
    }
}
