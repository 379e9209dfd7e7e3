use crate::auth::JwtConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 8080 | HTTP port |
/// | DATABASE_URL | sqlite://data/shop.db | SQLite database |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | default log level (RUST_LOG wins) |
/// | LOG_DIR | - | daily rolling log directory |
/// | JWT_SECRET | dev key | HS256 secret, required outside development |
/// | JWT_EXPIRATION_MINUTES | 1440 | token lifetime |
/// | ADMIN_EMAIL / ADMIN_PASSWORD | - | bootstrap admin account |
/// | PAYPAL_CLIENT_ID / PAYPAL_CLIENT_SECRET | - | PayPal REST credentials |
/// | PAYPAL_API_BASE | sandbox | PayPal REST base URL |
/// | EVM_RPC_URL | - | JSON-RPC endpoint for wallet payments |
/// | MAX_CATEGORY_DEPTH | 5 | number of category levels allowed |
/// | REQUEST_TIMEOUT_MS | 30000 | outbound HTTP timeout |
/// | TRUST_PROXY_HEADERS | false | rate-limit by `X-Forwarded-For` |
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub database_url: String,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub jwt: JwtConfig,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub paypal: Option<PaypalConfig>,
    pub evm_rpc_url: Option<String>,
    pub max_category_depth: i32,
    pub request_timeout_ms: u64,
    /// Take the client IP from `X-Forwarded-For`. Only safe behind a proxy
    /// that overwrites the header.
    pub trust_proxy_headers: bool,
}

/// PayPal REST credentials
#[derive(Debug, Clone)]
pub struct PaypalConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production-use-only")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let jwt_secret = Self::require_secret("JWT_SECRET", &environment)?;
        if environment != "development" && jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters long".into());
        }

        let paypal = match (
            non_empty_var("PAYPAL_CLIENT_ID"),
            non_empty_var("PAYPAL_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(client_secret)) => Some(PaypalConfig {
                client_id,
                client_secret,
                api_base: std::env::var("PAYPAL_API_BASE")
                    .unwrap_or_else(|_| "https://api-m.sandbox.paypal.com".into()),
            }),
            _ => None,
        };

        Ok(Self {
            http_port: parse_var("HTTP_PORT").unwrap_or(8080),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/shop.db".into()),
            environment,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: non_empty_var("LOG_DIR"),
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_minutes: parse_var("JWT_EXPIRATION_MINUTES").unwrap_or(1440),
                issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "shop-server".into()),
                audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "shop-clients".into()),
            },
            admin_email: non_empty_var("ADMIN_EMAIL"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
            paypal,
            evm_rpc_url: non_empty_var("EVM_RPC_URL"),
            max_category_depth: parse_var("MAX_CATEGORY_DEPTH").unwrap_or(5),
            request_timeout_ms: parse_var("REQUEST_TIMEOUT_MS").unwrap_or(30000),
            trust_proxy_headers: parse_var("TRUST_PROXY_HEADERS").unwrap_or(false),
        })
    }

    /// Configuration for tests and embedded use: in-memory database, no
    /// external providers.
    pub fn for_tests() -> Self {
        Self {
            http_port: 0,
            database_url: "sqlite::memory:".into(),
            environment: "development".into(),
            log_level: "info".into(),
            log_dir: None,
            jwt: JwtConfig {
                secret: "test-secret-key-with-at-least-32-characters".into(),
                expiration_minutes: 60,
                issuer: "shop-server".into(),
                audience: "shop-clients".into(),
            },
            admin_email: None,
            admin_password: None,
            paypal: None,
            evm_rpc_url: None,
            max_category_depth: 5,
            request_timeout_ms: 5000,
            // Requests are built in-process and carry their client in the header
            trust_proxy_headers: true,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
