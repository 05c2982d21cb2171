use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// One year; longer lifetimes are rejected at startup
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 366;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub billing: BillingConfig,
    pub replies: ReplyConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// Full connection URL; when absent the discrete host/port/name fields are used
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub require_tls: bool,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub outbound_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub restrict_parent_responses: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    pub frontend_url: String,
    pub stripe_api_base: String,
    #[serde(skip_serializing)]
    pub stripe_secret_key: Option<String>,
    #[serde(skip_serializing)]
    pub stripe_webhook_secret: Option<String>,
    pub webhook_tolerance_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    pub api_base: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

const DEV_JWT_SECRET: &str = "penpals-development-secret-change-me";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = parse_var("PORT", &v)?;
        }
        if let Ok(v) = env::var("STATIC_DIR") {
            self.server.static_dir = if v.trim().is_empty() { None } else { Some(v) };
        }

        // Database overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.database.backend = match v.as_str() {
                "postgres" => StoreBackend::Postgres,
                "memory" => StoreBackend::Memory,
                _ => return Err(ConfigError::Invalid { name: "STORE_BACKEND", value: v }),
            };
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DB_HOST") {
            self.database.host = v;
        }
        if let Ok(v) = env::var("DB_PORT") {
            self.database.port = parse_var("DB_PORT", &v)?;
        }
        if let Ok(v) = env::var("DB_NAME") {
            self.database.name = v;
        }
        if let Ok(v) = env::var("DB_USER") {
            self.database.user = v;
        }
        if let Ok(v) = env::var("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse_var("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = parse_var("API_ENABLE_RATE_LIMITING", &v)?;
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = parse_var("API_RATE_LIMIT_REQUESTS", &v)?;
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = parse_var("API_RATE_LIMIT_WINDOW_SECS", &v)?;
        }
        if let Ok(v) = env::var("OUTBOUND_TIMEOUT_SECS") {
            self.api.outbound_timeout_secs = parse_var("OUTBOUND_TIMEOUT_SECS", &v)?;
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = parse_var("JWT_EXPIRY_HOURS", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_RESTRICT_PARENT_RESPONSES") {
            self.security.restrict_parent_responses =
                parse_var("SECURITY_RESTRICT_PARENT_RESPONSES", &v)?;
        }

        // The frontend URL doubles as the CORS origin and the checkout redirect base
        if let Ok(v) = env::var("FRONTEND_URL") {
            url::Url::parse(&v)
                .map_err(|_| ConfigError::Invalid { name: "FRONTEND_URL", value: v.clone() })?;
            let origin = v.trim_end_matches('/').to_string();
            self.security.cors_origins = vec![origin.clone()];
            self.billing.frontend_url = origin;
        }

        // Billing overrides
        if let Ok(v) = env::var("STRIPE_SECRET_KEY") {
            self.billing.stripe_secret_key = Some(v);
        }
        if let Ok(v) = env::var("STRIPE_WEBHOOK_SECRET") {
            self.billing.stripe_webhook_secret = Some(v);
        }
        if let Ok(v) = env::var("STRIPE_API_BASE") {
            self.billing.stripe_api_base = v;
        }

        // Reply generation overrides
        if let Ok(v) = env::var("OPENAI_API_KEY") {
            self.replies.api_key = Some(v);
        }
        if let Ok(v) = env::var("OPENAI_API_BASE") {
            self.replies.api_base = v;
        }
        if let Ok(v) = env::var("OPENAI_MODEL") {
            self.replies.model = v;
        }

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.environment != Environment::Development && self.security.jwt_secret == DEV_JWT_SECRET {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.security.jwt_expiry_hours == 0 || self.security.jwt_expiry_hours > MAX_JWT_EXPIRY_HOURS {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRY_HOURS",
                value: self.security.jwt_expiry_hours.to_string(),
            });
        }
        if self.api.enable_rate_limiting
            && (self.api.rate_limit_requests == 0 || self.api.rate_limit_window_secs == 0)
        {
            return Err(ConfigError::Invalid {
                name: "API_RATE_LIMIT_REQUESTS",
                value: format!(
                    "{} per {}s",
                    self.api.rate_limit_requests, self.api.rate_limit_window_secs
                ),
            });
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                static_dir: Some("public".to_string()),
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                name: "north_pole_penpals".to_string(),
                user: "postgres".to_string(),
                password: "password".to_string(),
                require_tls: false,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 100,
                rate_limit_window_secs: 15 * 60,
                outbound_timeout_secs: 30,
            },
            security: SecurityConfig {
                cors_origins: vec![DEFAULT_FRONTEND_URL.to_string()],
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                restrict_parent_responses: false,
            },
            billing: BillingConfig {
                frontend_url: DEFAULT_FRONTEND_URL.to_string(),
                stripe_api_base: "https://api.stripe.com".to_string(),
                stripe_secret_key: None,
                stripe_webhook_secret: None,
                webhook_tolerance_secs: 300,
            },
            replies: ReplyConfig {
                api_base: "https://api.openai.com".to_string(),
                api_key: None,
                model: "gpt-3.5-turbo".to_string(),
                max_tokens: 300,
                temperature: 0.8,
            },
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.jwt_secret = String::new();
        config
    }

    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.require_tls = true;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.security.jwt_secret = String::new();
        config
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value: value.to_string() })
}
