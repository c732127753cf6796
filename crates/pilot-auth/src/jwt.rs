//! JWT authentication

use std::collections::HashMap;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pilot_core::traits::Id;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Global permission names
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Extra grants limited to single programs, keyed by program id
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub program_permissions: HashMap<Id, Vec<String>>,
}

impl Claims {
    pub fn new(user_id: Id, role: Role, expires_in_seconds: i64) -> Self {
        let now = Utc::now().timestamp().max(0) as usize;
        Self {
            sub: user_id.to_string(),
            exp: now + expires_in_seconds.max(0) as usize,
            iat: now,
            jti: Some(uuid::Uuid::new_v4().to_string()),
            email: None,
            role,
            permissions: Vec::new(),
            program_permissions: HashMap::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn user_id(&self) -> Result<Id, JwtError> {
        self.sub
            .parse()
            .map_err(|_| JwtError::Invalid("Invalid user ID in token".to_string()))
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token is expired")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Missing token")]
    Missing,
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),
}

/// Issues and validates HS256 tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: Option<String>,
    audience: Option<String>,
}

impl JwtService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: None,
            audience: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Sign the given claims with HS256
    pub fn create_token(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();

        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer.clone()]);
        }

        if let Some(ref audience) = self.audience {
            validation.set_audience(&[audience.clone()]);
        }

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    pub fn get_user_id(&self, token: &str) -> Result<Id, JwtError> {
        self.validate_token(token)?.user_id()
    }
}

/// Extract bearer token from an Authorization header value
pub fn extract_bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-at-least-32-bytes";

    #[test]
    fn test_create_and_validate_token() {
        let service = JwtService::new(SECRET);
        let claims = Claims::new(1, Role::User, 3600)
            .with_email("field@example.com")
            .with_permissions(["submit_data"]);

        let token = service.create_token(&claims).unwrap();
        let decoded = service.validate_token(&token).unwrap();

        assert_eq!(decoded.sub, "1");
        assert_eq!(decoded.email.as_deref(), Some("field@example.com"));
        assert_eq!(decoded.role, Role::User);
        assert_eq!(decoded.permissions, vec!["submit_data".to_string()]);
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new(SECRET);
        let mut claims = Claims::new(1, Role::User, 0);
        claims.exp = claims.iat.saturating_sub(3600);

        let token = service.create_token(&claims).unwrap();
        assert!(matches!(service.validate_token(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtService::new(SECRET)
            .create_token(&Claims::new(1, Role::Admin, 3600))
            .unwrap();
        let other = JwtService::new(b"another-secret-key-at-least-32-bytes");
        assert!(matches!(other.validate_token(&token), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_role_defaults_to_user() {
        let claims: Claims =
            serde_json::from_str(r#"{ "sub": "9", "exp": 1, "iat": 0 }"#).unwrap();
        assert_eq!(claims.role, Role::User);
        assert!(claims.permissions.is_empty());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_get_user_id() {
        let service = JwtService::new(SECRET);
        let token = service.create_token(&Claims::new(42, Role::User, 3600)).unwrap();
        assert_eq!(service.get_user_id(&token).unwrap(), 42);
    }
}
