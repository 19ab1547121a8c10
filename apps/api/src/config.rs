use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::{LlmSettings, ModelNames, ModelParams};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub storage: StorageConfig,
    pub llm: LlmSettings,
    /// Allowed CORS origins. The first entry is used for links in emails.
    pub frontend_urls: Vec<String>,
    pub port: u16,
    pub rust_log: String,
    pub app_env: String,
    pub rate_limit: RateLimitConfig,
    pub max_upload_bytes: usize,
}

/// S3-compatible object storage (Supabase Storage by default).
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u64,
    pub window_secs: u64,
    /// Key clients by the first `X-Forwarded-For` hop instead of the peer address.
    pub trust_proxy: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase_url = require_var(&lookup, "SUPABASE_URL")?
            .trim_end_matches('/')
            .to_string();

        let frontend_urls: Vec<String> = optional_var(&lookup, "FRONTEND_URL", "http://localhost:3000")
            .split(',')
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .collect();

        let storage = StorageConfig {
            bucket: optional_var(&lookup, "S3_BUCKET", "resumes"),
            endpoint: lookup("S3_ENDPOINT")
                .unwrap_or_else(|| format!("{supabase_url}/storage/v1/s3")),
            region: optional_var(&lookup, "S3_REGION", "us-east-1"),
            access_key_id: require_var(&lookup, "AWS_ACCESS_KEY_ID")?,
            secret_access_key: require_var(&lookup, "AWS_SECRET_ACCESS_KEY")?,
        };

        let llm = LlmSettings {
            api_key: require_var(&lookup, "OPENROUTER_API_KEY")?,
            base_url: optional_var(&lookup, "OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1"),
            referer: frontend_urls
                .first()
                .cloned()
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            models: ModelNames {
                skill_extraction: optional_var(&lookup, "SKILL_EXTRACTION_MODEL", DEFAULT_MODEL),
                gap_analysis: optional_var(&lookup, "GAP_ANALYSIS_MODEL", DEFAULT_MODEL),
                learning_path: optional_var(&lookup, "LEARNING_PATH_MODEL", DEFAULT_MODEL),
            },
            params: ModelParams {
                max_tokens: parse_var(&lookup, "LLM_MAX_TOKENS", 1000)?,
                ..ModelParams::default()
            },
        };

        Ok(Config {
            database_url: require_var(&lookup, "DATABASE_URL")?,
            redis_url: require_var(&lookup, "REDIS_URL")?,
            supabase_anon_key: require_var(&lookup, "SUPABASE_ANON_KEY")?,
            supabase_url,
            storage,
            llm,
            frontend_urls,
            port: parse_var(&lookup, "PORT", 3001)?,
            rust_log: optional_var(&lookup, "RUST_LOG", "info"),
            app_env: optional_var(&lookup, "APP_ENV", "development"),
            rate_limit: RateLimitConfig {
                max_requests: parse_var(&lookup, "RATE_LIMIT_MAX_REQUESTS", 100)?,
                window_secs: parse_var(&lookup, "RATE_LIMIT_WINDOW_SECS", 900)?,
                trust_proxy: parse_var(&lookup, "TRUST_PROXY", false)?,
            },
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Base URL of the web app, used for password-reset redirects.
    pub fn primary_frontend_url(&self) -> &str {
        self.frontend_urls
            .first()
            .map(String::as_str)
            .unwrap_or("http://localhost:3000")
    }

    /// Public URL of an object in the storage bucket.
    pub fn public_object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.supabase_url, self.storage.bucket, key
        )
    }
}

fn require_var<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_var<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|value| !value.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .with_context(|| format!("{key} must be a valid value, got '{raw}'")),
        None => Ok(default),
    }
}
