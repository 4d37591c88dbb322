//! Environment configuration. Read once at startup.

use std::path::PathBuf;

use anyhow::{Context, bail};

use lumen_api::explain::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT, ExplainConfig};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub host: String,
    pub port: u16,
    pub cors_origins: CorsOrigins,
    pub verses_path: Option<PathBuf>,
    pub explain: ExplainConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(database_url) = get("LUMEN_DATABASE_URL") else {
            bail!("LUMEN_DATABASE_URL is not set");
        };
        let database_path = PathBuf::from(strip_sqlite_scheme(database_url.trim()));

        let jwt_secret = get("LUMEN_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("LUMEN_JWT_SECRET is unset or still a placeholder");
        }

        let ttl_hours = match get("LUMEN_TOKEN_TTL_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .context("LUMEN_TOKEN_TTL_HOURS must be a whole number of hours")?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };
        if ttl_hours < 1 {
            bail!("LUMEN_TOKEN_TTL_HOURS must be at least 1");
        }

        let port = match get("LUMEN_PORT") {
            Some(raw) => raw.trim().parse().context("LUMEN_PORT must be a port number")?,
            None => DEFAULT_PORT,
        };

        let cors_origins = parse_origins(&get("LUMEN_CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.into()));

        Ok(Self {
            database_path,
            jwt_secret,
            token_ttl: chrono::Duration::hours(ttl_hours),
            host: get("LUMEN_HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
            cors_origins,
            verses_path: get("LUMEN_VERSES_PATH").map(PathBuf::from),
            explain: ExplainConfig {
                endpoint: get("LUMEN_EXPLAIN_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.into()),
                model: get("LUMEN_EXPLAIN_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
                // Normalized and checked per request so a bad key only breaks explain.
                api_key: lookup("OPENAI_API_KEY"),
                timeout: DEFAULT_TIMEOUT,
            },
        })
    }
}

fn strip_sqlite_scheme(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}

fn parse_origins(raw: &str) -> CorsOrigins {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();
    if origins.iter().any(|o| o == "*") {
        CorsOrigins::Any
    } else {
        CorsOrigins::List(origins)
    }
}
