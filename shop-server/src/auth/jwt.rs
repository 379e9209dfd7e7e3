//! JWT token service
//!
//! Issues and validates HS256 access tokens for customers and staff.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role name carried by customer tokens
pub const CUSTOMER_ROLE: &str = "customer";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 secret (at least 32 bytes outside development)
    pub secret: String,
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

/// Claims stored in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    /// Role name, `customer` for accounts without a role
    pub role: String,
    /// Comma-separated permission list
    pub permissions: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

#[derive(Debug, Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn generate_token(
        &self,
        user_id: i64,
        email: &str,
        role: &str,
        permissions: &[String],
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            permissions: permissions.join(","),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Extract the token from an `Authorization` header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }

    pub fn expires_in_seconds(&self) -> i64 {
        self.config.expiration_minutes * 60
    }
}

/// Authenticated user context, built from validated claims
///
/// Injected by [`super::require_auth`] and available as an extractor.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = std::num::ParseIntError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let permissions = if claims.permissions.is_empty() {
            vec![]
        } else {
            claims
                .permissions
                .split(',')
                .map(|s| s.to_string())
                .collect()
        };

        Ok(Self {
            id: claims.sub.parse()?,
            email: claims.email,
            role: claims.role,
            permissions,
        })
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn is_customer(&self) -> bool {
        self.role == CUSTOMER_ROLE
    }

    /// Check a permission
    ///
    /// - admins and the `all` permission grant everything
    /// - `"catalog:*"` matches `"catalog:manage"`
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_admin() {
            return true;
        }

        if self.permissions.iter().any(|p| p == "all") {
            return true;
        }

        self.permissions.iter().any(|p| {
            if p == permission {
                return true;
            }
            if let Some(prefix) = p.strip_suffix(":*") {
                permission.starts_with(&format!("{}:", prefix))
            } else {
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "unit-test-secret-key-with-at-least-32-chars".into(),
            expiration_minutes: 10,
            issuer: "shop-server".into(),
            audience: "shop-clients".into(),
        })
    }

    fn user(role: &str, permissions: &[&str]) -> CurrentUser {
        CurrentUser {
            id: 1,
            email: "a@b.vn".into(),
            role: role.into(),
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = service();
        let token = service
            .generate_token(42, "lan@shop.vn", "staff", &["orders:manage".into()])
            .unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, "staff");

        let current = CurrentUser::try_from(claims).unwrap();
        assert_eq!(current.id, 42);
        assert_eq!(current.permissions, vec!["orders:manage".to_string()]);
    }

    #[test]
    fn test_token_from_other_audience_rejected() {
        let token = service().generate_token(1, "x@y.z", "customer", &[]).unwrap();

        let other = JwtService::with_config(JwtConfig {
            audience: "someone-else".into(),
            ..service().config
        });
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let token = service().generate_token(1, "x@y.z", "customer", &[]).unwrap();
        let other = JwtService::with_config(JwtConfig {
            secret: "a-completely-different-secret-of-32-chars!!".into(),
            ..service().config
        });
        assert!(matches!(
            other.validate_token(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_permissions() {
        let staff = user("staff", &["catalog:*", "orders:manage"]);
        assert!(staff.has_permission("catalog:manage"));
        assert!(staff.has_permission("orders:manage"));
        assert!(!staff.has_permission("settings:manage"));

        assert!(user("admin", &[]).has_permission("roles:manage"));
        assert!(user("ops", &["all"]).has_permission("users:manage"));
        assert!(!user(CUSTOMER_ROLE, &[]).has_permission("catalog:manage"));
    }
}
