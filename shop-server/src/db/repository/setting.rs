//! Site Setting Repository
//!
//! Key/value rows holding JSON documents. The storefront configuration lives
//! under [`SITE_KEY`].

use super::RepoResult;
use shared::models::SiteSettings;
use sqlx::SqlitePool;

pub const SITE_KEY: &str = "site";

/// Stored site settings, or the defaults when none were saved yet
pub async fn get_site(pool: &SqlitePool) -> RepoResult<SiteSettings> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM site_setting WHERE key = ?")
        .bind(SITE_KEY)
        .fetch_optional(pool)
        .await?;

    match value {
        Some(json) => match serde_json::from_str(&json) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(error = %e, "Stored site settings are unreadable, using defaults");
                Ok(SiteSettings::default())
            }
        },
        None => Ok(SiteSettings::default()),
    }
}

pub async fn save_site(pool: &SqlitePool, settings: &SiteSettings) -> RepoResult<()> {
    let json = serde_json::to_string(settings)?;
    sqlx::query(
        "INSERT INTO site_setting (key, value, updated_at) VALUES (?, ?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(SITE_KEY)
    .bind(json)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    Ok(())
}
