//! CineRank Configuration Management
//!
//! All settings come from process environment variables. Connection and
//! signing settings are required; everything else has a development default.

use serde::{Deserialize, Serialize};

use crate::ranking::RANKINGS_PLACEHOLDER;

/// Upper bound for token lifetimes (one year)
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Document store connection
    pub database: DatabaseConfig,

    /// Token signing configuration
    pub auth: AuthConfig,

    /// Review classifier configuration
    pub llm: LlmConfig,

    /// Catalog query settings
    pub catalog: CatalogConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Empty values are treated as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingRequired(key.to_string()));

        let mut config = Self::default();

        // Server
        if let Some(host) = get("API_HOST") {
            config.server.host = host;
        }
        if let Some(port) = get("API_PORT") {
            config.server.port = parse_value("API_PORT", port)?;
        }
        if let Some(secs) = get("REQUEST_TIMEOUT_SECS") {
            config.server.request_timeout_secs = parse_value("REQUEST_TIMEOUT_SECS", secs)?;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Document store
        config.database.url = required("DATABASE_URL")?;
        config.database.name = required("DATABASE_NAME")?;
        if let Some(ns) = get("DATABASE_NAMESPACE") {
            config.database.namespace = ns;
        }
        if let Some(user) = get("DATABASE_USER") {
            config.database.user = user;
        }
        if let Some(pass) = get("DATABASE_PASS") {
            config.database.pass = pass;
        }

        // Token signing
        config.auth.secret_key = required("SECRET_KEY")?;
        config.auth.secret_refresh_key = required("SECRET_REFRESH_KEY")?;
        if let Some(issuer) = get("JWT_ISSUER") {
            config.auth.issuer = issuer;
        }
        if let Some(secs) = get("ACCESS_TOKEN_TTL_SECS") {
            config.auth.access_ttl_secs = parse_ttl("ACCESS_TOKEN_TTL_SECS", secs)?;
        }
        if let Some(secs) = get("REFRESH_TOKEN_TTL_SECS") {
            config.auth.refresh_ttl_secs = parse_ttl("REFRESH_TOKEN_TTL_SECS", secs)?;
        }

        // Classifier
        config.llm.prompt_template = required("BASE_PROMPT_TEMPLATE")?;
        if !config.llm.prompt_template.contains(RANKINGS_PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                key: "BASE_PROMPT_TEMPLATE".to_string(),
                value: format!("missing {RANKINGS_PLACEHOLDER} placeholder"),
            });
        }
        if let Some(provider) = get("LLM_PROVIDER") {
            config.llm.provider = provider.parse()?;
        }
        config.llm.api_key = get("LLM_API_KEY").or_else(|| match config.llm.provider {
            LlmProvider::Gemini => get("GEMINI_API_KEY"),
            LlmProvider::OpenAI => get("OPENAI_API_KEY"),
        });
        if let Some(url) = get("LLM_BASE_URL") {
            config.llm.base_url = Some(url);
        }
        match get("LLM_MODEL") {
            Some(model) => config.llm.model = model,
            None => config.llm.model = config.llm.provider.default_model().to_string(),
        }
        if let Some(secs) = get("LLM_TIMEOUT_SECS") {
            config.llm.timeout_secs = parse_value("LLM_TIMEOUT_SECS", secs)?;
        }

        // Catalog
        if let Some(limit) = get("RECOMMENDED_MOVIE_LIMIT") {
            config.catalog.recommended_movie_limit = parse_value("RECOMMENDED_MOVIE_LIMIT", limit)?;
        }

        // Logging
        if let Some(level) = get("LOG_LEVEL") {
            config.logging.level = Some(level);
        }
        if let Some(format) = get("LOG_FORMAT") {
            config.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(config)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Token lifetime in seconds, between 1 and `MAX_TOKEN_TTL_SECS`
fn parse_ttl(key: &str, value: String) -> Result<u64, ConfigError> {
    let secs: u64 = parse_value(key, value.clone())?;
    if secs == 0 || secs > MAX_TOKEN_TTL_SECS {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        });
    }
    Ok(secs)
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Upper bound for a single store operation, in seconds
    pub request_timeout_secs: u64,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 5,
            cors_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Document store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string: `ws://host:port`, `wss://host:port`, or `mem://`
    pub url: String,

    /// Database name
    pub name: String,

    /// SurrealDB namespace
    pub namespace: String,

    /// SurrealDB username
    pub user: String,

    /// SurrealDB password
    pub pass: String,
}

impl DatabaseConfig {
    /// Check whether the in-process store was requested
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("mem://")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000".to_string(),
            name: "cinerank".to_string(),
            namespace: "cinerank".to_string(),
            user: "root".to_string(),
            pass: "root".to_string(),
        }
    }
}

/// Token signing configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub secret_key: String,

    /// HMAC secret for refresh tokens
    pub secret_refresh_key: String,

    /// Token issuer
    pub issuer: String,

    /// Access token lifetime in seconds (default: 1 hour)
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds (default: 24 hours)
    pub refresh_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            secret_refresh_key: String::new(),
            issuer: "CineRank".to_string(),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 86400,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("secret_refresh_key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

/// Review classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider to use
    pub provider: LlmProvider,

    /// Provider API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Override for the provider base URL
    pub base_url: Option<String>,

    /// Model name to use
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Prompt template containing a `{rankings}` placeholder
    pub prompt_template: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            api_key: None,
            base_url: None,
            model: LlmProvider::Gemini.default_model().to_string(),
            timeout_secs: 30,
            prompt_template: String::new(),
        }
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    OpenAI,
}

impl LlmProvider {
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini-2.5-flash",
            LlmProvider::OpenAI => "gpt-4o-mini",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            _ => Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Catalog query settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Maximum number of recommended movies returned
    pub recommended_movie_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            recommended_movie_limit: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset
    pub level: Option<String>,

    /// JSON format for logs
    pub json_format: bool,
}

impl LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub fn default_filter(&self) -> String {
        self.level
            .clone()
            .unwrap_or_else(|| "cinerank_api=debug,tower_http=debug".to_string())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "ws://localhost:8000"),
            ("DATABASE_NAME", "magic"),
            ("SECRET_KEY", "access-secret"),
            ("SECRET_REFRESH_KEY", "refresh-secret"),
            ("BASE_PROMPT_TEMPLATE", "Classify as one of {rankings}: "),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 5);
        assert_eq!(config.catalog.recommended_movie_limit, 5);
        assert_eq!(config.auth.access_ttl_secs, 3600);
        assert_eq!(config.auth.refresh_ttl_secs, 86400);
        assert_eq!(config.llm.provider, LlmProvider::Gemini);
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.database.name, "magic");
    }

    #[test]
    fn test_missing_required_values() {
        for key in [
            "DATABASE_URL",
            "DATABASE_NAME",
            "SECRET_KEY",
            "SECRET_REFRESH_KEY",
            "BASE_PROMPT_TEMPLATE",
        ] {
            let mut env = base_env();
            env.remove(key);
            let err = load(&env).unwrap_err();
            assert!(
                matches!(&err, ConfigError::MissingRequired(k) if k == key),
                "unexpected error for {key}: {err}"
            );
        }
    }

    #[test]
    fn test_empty_secret_is_missing() {
        let mut env = base_env();
        env.insert("SECRET_KEY", "   ");
        assert!(matches!(
            load(&env),
            Err(ConfigError::MissingRequired(k)) if k == "SECRET_KEY"
        ));
    }

    #[test]
    fn test_template_requires_placeholder() {
        let mut env = base_env();
        env.insert("BASE_PROMPT_TEMPLATE", "Classify this review: ");
        assert!(matches!(load(&env), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_token_ttl_bounds() {
        for (key, value) in [
            ("ACCESS_TOKEN_TTL_SECS", "18446744073709551615"),
            ("REFRESH_TOKEN_TTL_SECS", "31536001"),
            ("ACCESS_TOKEN_TTL_SECS", "0"),
        ] {
            let mut env = base_env();
            env.insert(key, value);
            assert!(
                matches!(&load(&env), Err(ConfigError::InvalidValue { key: k, .. }) if k == key),
                "{key}={value} should be rejected"
            );
        }

        let mut env = base_env();
        env.insert("REFRESH_TOKEN_TTL_SECS", "31536000");
        assert_eq!(load(&env).unwrap().auth.refresh_ttl_secs, MAX_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_invalid_limit_is_rejected() {
        let mut env = base_env();
        env.insert("RECOMMENDED_MOVIE_LIMIT", "five");
        assert!(matches!(
            load(&env),
            Err(ConfigError::InvalidValue { key, .. }) if key == "RECOMMENDED_MOVIE_LIMIT"
        ));
    }

    #[test]
    fn test_provider_specific_api_key() {
        let mut env = base_env();
        env.insert("LLM_PROVIDER", "openai");
        env.insert("OPENAI_API_KEY", "sk-test");
        env.insert("GEMINI_API_KEY", "gm-test");
        let config = load(&env).unwrap();

        assert_eq!(config.llm.provider, LlmProvider::OpenAI);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn test_cors_origins_split() {
        let mut env = base_env();
        env.insert("CORS_ORIGINS", "http://a.test, http://b.test,");
        let config = load(&env).unwrap();
        assert_eq!(config.server.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_auth_debug_redacts_secrets() {
        let config = load(&base_env()).unwrap();
        let debug = format!("{:?}", config.auth);
        assert!(!debug.contains("access-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_llm_provider_parse() {
        assert_eq!("Gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert!("invalid".parse::<LlmProvider>().is_err());
    }
}
