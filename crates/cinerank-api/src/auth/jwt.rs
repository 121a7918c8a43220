//! JWT token generation and validation
//!
//! Access and refresh tokens are signed with separate HMAC secrets. Expiry is
//! checked against an explicit clock so callers (and tests) control "now".

use chrono::Utc;
use cinerank_core::{AuthConfig, ConfigError, UserRole};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Standard JWT fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredClaims {
    /// Token issuer
    pub iss: String,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expiration (Unix seconds)
    pub exp: u64,
    /// Unique token id, so two tokens issued in the same second differ
    pub jti: String,
}

/// Who the token speaks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub user_id: String,
}

/// Complete token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub registered: RegisteredClaims,
    #[serde(flatten)]
    pub identity: IdentityClaims,
}

/// Freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Unsupported signing algorithm")]
    InvalidAlgorithm,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token lifetime overflows the expiry claim")]
    LifetimeOverflow,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl SigningKeys {
    fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }
}

/// Issues and validates access and refresh tokens
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    issuer: String,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        if config.secret_key.is_empty() {
            return Err(ConfigError::MissingRequired("SECRET_KEY".to_string()));
        }
        if config.secret_refresh_key.is_empty() {
            return Err(ConfigError::MissingRequired("SECRET_REFRESH_KEY".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.set_issuer(&[&config.issuer]);
        // exp is checked against the caller's clock in `validate_with`
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            access: SigningKeys::new(&config.secret_key, config.access_ttl_secs),
            refresh: SigningKeys::new(&config.secret_refresh_key, config.refresh_ttl_secs),
            issuer: config.issuer.clone(),
            validation,
        })
    }

    /// Issue a new access/refresh pair for `identity`
    pub fn issue(&self, identity: &IdentityClaims) -> Result<TokenPair, JwtError> {
        self.issue_at(identity, now_secs())
    }

    pub fn issue_at(&self, identity: &IdentityClaims, now: u64) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.sign(&self.access, identity, now)?,
            refresh_token: self.sign(&self.refresh, identity, now)?,
        })
    }

    pub fn validate_access(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_access_at(token, now_secs())
    }

    pub fn validate_access_at(&self, token: &str, now: u64) -> Result<Claims, JwtError> {
        self.validate_with(&self.access, token, now)
    }

    pub fn validate_refresh(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_refresh_at(token, now_secs())
    }

    pub fn validate_refresh_at(&self, token: &str, now: u64) -> Result<Claims, JwtError> {
        self.validate_with(&self.refresh, token, now)
    }

    fn sign(&self, keys: &SigningKeys, identity: &IdentityClaims, now: u64) -> Result<String, JwtError> {
        let exp = now
            .checked_add(keys.ttl_secs)
            .ok_or(JwtError::LifetimeOverflow)?;
        let claims = Claims {
            registered: RegisteredClaims {
                iss: self.issuer.clone(),
                iat: now,
                exp,
                jti: Uuid::new_v4().to_string(),
            },
            identity: identity.clone(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)?)
    }

    fn validate_with(&self, keys: &SigningKeys, token: &str, now: u64) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &keys.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    JwtError::InvalidAlgorithm
                }
                ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                _ => JwtError::InvalidToken,
            }
        })?;

        if token_data.claims.registered.exp <= now {
            return Err(JwtError::ExpiredToken);
        }

        Ok(token_data.claims)
    }
}

fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            secret_key: "access-secret".to_string(),
            secret_refresh_key: "refresh-secret".to_string(),
            ..Default::default()
        }
    }

    fn identity() -> IdentityClaims {
        IdentityClaims {
            email: "test@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role: UserRole::Admin,
            user_id: "user-1".to_string(),
        }
    }

    #[test]
    fn test_overflowing_lifetime_is_an_error() {
        let service = TokenService::new(&AuthConfig {
            access_ttl_secs: u64::MAX,
            ..config()
        })
        .unwrap();

        assert!(matches!(
            service.issue_at(&identity(), 1_700_000_000),
            Err(JwtError::LifetimeOverflow)
        ));
    }

    #[test]
    fn test_issue_and_validate() {
        let service = TokenService::new(&config()).unwrap();
        let pair = service.issue(&identity()).unwrap();

        let claims = service.validate_access(&pair.access_token).unwrap();
        assert_eq!(claims.identity, identity());
        assert_eq!(claims.registered.iss, "CineRank");
        assert_eq!(claims.registered.exp - claims.registered.iat, 3600);

        let refresh = service.validate_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.registered.exp - refresh.registered.iat, 86400);
    }

    #[test]
    fn test_expires_when_clock_advances() {
        let service = TokenService::new(&config()).unwrap();
        let now = 1_700_000_000;
        let pair = service.issue_at(&identity(), now).unwrap();

        assert!(service.validate_access_at(&pair.access_token, now + 3599).is_ok());
        assert!(matches!(
            service.validate_access_at(&pair.access_token, now + 3600),
            Err(JwtError::ExpiredToken)
        ));
        assert!(service.validate_refresh_at(&pair.refresh_token, now + 3600).is_ok());
    }

    #[test]
    fn test_wrong_secret() {
        let issuer = TokenService::new(&config()).unwrap();
        let other = TokenService::new(&AuthConfig {
            secret_key: "another-secret".to_string(),
            ..config()
        })
        .unwrap();

        let pair = issuer.issue(&identity()).unwrap();
        assert!(matches!(
            other.validate_access(&pair.access_token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_access_and_refresh_secrets_are_separate() {
        let service = TokenService::new(&config()).unwrap();
        let pair = service.issue(&identity()).unwrap();

        assert!(service.validate_refresh(&pair.access_token).is_err());
        assert!(service.validate_access(&pair.refresh_token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let issuer = TokenService::new(&AuthConfig {
            issuer: "someone-else".to_string(),
            ..config()
        })
        .unwrap();
        let service = TokenService::new(&config()).unwrap();

        let pair = issuer.issue(&identity()).unwrap();
        assert!(matches!(
            service.validate_access(&pair.access_token),
            Err(JwtError::InvalidIssuer)
        ));
    }

    #[test]
    fn test_other_hmac_algorithms_accepted() {
        let service = TokenService::new(&config()).unwrap();
        let now = now_secs();
        let claims = Claims {
            registered: RegisteredClaims {
                iss: "CineRank".to_string(),
                iat: now,
                exp: now + 60,
                jti: "jti".to_string(),
            },
            identity: identity(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"access-secret"),
        )
        .unwrap();

        assert_eq!(service.validate_access(&token).unwrap(), claims);
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        let service = TokenService::new(&config()).unwrap();
        // {"alg":"RS256","typ":"JWT"}.{"sub":"1"}
        let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiIxIn0.c2ln";

        assert!(matches!(
            service.validate_access(token),
            Err(JwtError::InvalidAlgorithm)
        ));
    }

    #[test]
    fn test_garbage_token() {
        let service = TokenService::new(&config()).unwrap();
        assert!(matches!(
            service.validate_access("invalid.token.here"),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = TokenService::new(&AuthConfig {
            secret_refresh_key: String::new(),
            ..config()
        });
        assert!(matches!(result, Err(ConfigError::MissingRequired(k)) if k == "SECRET_REFRESH_KEY"));
    }

    #[test]
    fn test_tokens_issued_together_differ() {
        let service = TokenService::new(&config()).unwrap();
        let a = service.issue_at(&identity(), 1_700_000_000).unwrap();
        let b = service.issue_at(&identity(), 1_700_000_000).unwrap();
        assert_ne!(a.access_token, b.access_token);
    }
}
