//! Server state
//!
//! Shared singletons handed to every handler. Cloning is cheap: the pool and
//! every service are reference counted.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use sqlx::SqlitePool;

use crate::AppError;
use crate::auth::{JwtService, RateLimiter, hash_password};
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::{role, user};
use crate::payments::evm::{ChainRpc, JsonRpcClient};
use crate::payments::paypal::PaypalClient;

/// Resource name of the storefront catalog (categories + products)
pub const CATALOG_RESOURCE: &str = "catalog";

/// Monotonic per-resource version counters
///
/// Bumped on every mutation so storefront caches can tell stale data apart.
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the new version (first call returns 1)
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Current version, 0 when never bumped
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

/// Server state
///
/// | Field | Role |
/// |-------|------|
/// | `pool` | SQLite pool |
/// | `jwt_service` | token issue / validation |
/// | `resource_versions` | catalog cache busting |
/// | `rate_limiter` | login / register throttling |
/// | `paypal` | PayPal REST client, `None` when not configured |
/// | `chain` | EVM JSON-RPC, `None` when not configured |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub resource_versions: Arc<ResourceVersions>,
    pub rate_limiter: RateLimiter,
    pub paypal: Option<Arc<PaypalClient>>,
    pub chain: Option<Arc<dyn ChainRpc>>,
}

impl ServerState {
    /// Build state around an open pool
    pub fn new(config: Config, pool: SqlitePool) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        let paypal = config
            .paypal
            .clone()
            .map(|pp| Arc::new(PaypalClient::new(http.clone(), pp)));
        let chain = config
            .evm_rpc_url
            .clone()
            .map(|url| Arc::new(JsonRpcClient::new(http.clone(), url)) as Arc<dyn ChainRpc>);

        Ok(Self {
            jwt_service: Arc::new(JwtService::with_config(config.jwt.clone())),
            resource_versions: Arc::new(ResourceVersions::new()),
            rate_limiter: RateLimiter::new(),
            paypal,
            chain,
            pool,
            config,
        })
    }

    /// Open the configured database, run migrations and bootstrap the admin
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = DbService::new(&config.database_url).await?;
        let state = Self::new(config.clone(), db.pool)?;
        state.bootstrap_admin().await?;
        Ok(state)
    }

    /// Same as [`initialize`](Self::initialize) on a private in-memory database
    pub async fn in_memory(config: Config) -> Result<Self, AppError> {
        let db = DbService::in_memory().await?;
        let state = Self::new(config, db.pool)?;
        state.bootstrap_admin().await?;
        Ok(state)
    }

    /// Replace the chain client (tests, alternative providers)
    pub fn with_chain(mut self, chain: Arc<dyn ChainRpc>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Create the first admin from `ADMIN_EMAIL` / `ADMIN_PASSWORD` on an empty user table
    async fn bootstrap_admin(&self) -> Result<(), AppError> {
        let (Some(email), Some(password)) = (&self.config.admin_email, &self.config.admin_password)
        else {
            return Ok(());
        };
        if user::count(&self.pool).await? > 0 {
            return Ok(());
        }

        let admin_role = role::find_by_name(&self.pool, "admin")
            .await?
            .ok_or_else(|| AppError::internal("Built-in admin role is missing"))?;
        let password_hash = hash_password(password)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

        let admin = user::create(
            &self.pool,
            user::NewUser {
                email,
                password_hash: &password_hash,
                full_name: "Administrator",
                phone: None,
                role_id: Some(admin_role.id),
            },
        )
        .await?;
        tracing::info!(user_id = admin.id, email = %admin.email, "Bootstrap admin created");
        Ok(())
    }

    /// Bump the catalog version after a category or product change
    pub fn bump_catalog(&self) -> u64 {
        self.resource_versions.increment(CATALOG_RESOURCE)
    }
}
