//! JWT access and refresh tokens

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use postline_core::{
    AuthConfig, TokenAlgorithm, MAX_ACCESS_TOKEN_MINUTES, MAX_REFRESH_TOKEN_DAYS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by both token kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub token_type: TokenType,
    /// Refresh tokens only; matches `users.refresh_token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Result of a successful login or refresh
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Stored server-side so the refresh token can be revoked
    pub refresh_id: String,
    pub expires_in: i64,
}

/// Signs and verifies tokens with the configured secret
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Lifetimes are clamped to the accepted config range so token expiry
    /// arithmetic cannot overflow even for an unvalidated config.
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.secret_key.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm: match config.algorithm {
                TokenAlgorithm::HS256 => Algorithm::HS256,
                TokenAlgorithm::HS384 => Algorithm::HS384,
                TokenAlgorithm::HS512 => Algorithm::HS512,
            },
            access_ttl: Duration::minutes(
                config.access_token_minutes.clamp(1, MAX_ACCESS_TOKEN_MINUTES),
            ),
            refresh_ttl: Duration::days(config.refresh_token_days.clamp(1, MAX_REFRESH_TOKEN_DAYS)),
        }
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Issue a fresh access/refresh pair.
    pub fn issue(&self, user_id: i64, username: &str) -> Result<IssuedTokens, AuthError> {
        let now = Utc::now();
        let refresh_id = Uuid::new_v4().to_string();

        let access = Claims {
            sub: user_id.to_string(),
            username: username.to_owned(),
            token_type: TokenType::Access,
            jti: None,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        let refresh = Claims {
            token_type: TokenType::Refresh,
            jti: Some(refresh_id.clone()),
            exp: (now + self.refresh_ttl).timestamp(),
            ..access.clone()
        };

        Ok(IssuedTokens {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            refresh_id,
            expires_in: self.access_ttl_secs(),
        })
    }

    /// Verify signature, expiry and token kind.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let validation = Validation::new(self.algorithm);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::InvalidToken
        })?;

        if data.claims.token_type != expected {
            return Err(AuthError::InvalidToken);
        }
        if expected == TokenType::Refresh && data.claims.jti.is_none() {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(encode(&Header::new(self.algorithm), claims, &self.encoding)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&AuthConfig {
            secret_key: secret.to_string(),
            ..AuthConfig::default()
        })
    }

    #[test]
    fn issued_tokens_verify() {
        let tokens = service("k").issue(7, "alice").unwrap();
        assert_eq!(tokens.expires_in, 15 * 60);

        let access = service("k").verify(&tokens.access_token, TokenType::Access).unwrap();
        assert_eq!(access.user_id().unwrap(), 7);
        assert_eq!(access.username, "alice");
        assert!(access.jti.is_none());

        let refresh = service("k").verify(&tokens.refresh_token, TokenType::Refresh).unwrap();
        assert_eq!(refresh.jti.as_deref(), Some(tokens.refresh_id.as_str()));
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let svc = service("k");
        let tokens = svc.issue(1, "bob").unwrap();

        assert!(svc.verify(&tokens.refresh_token, TokenType::Access).is_err());
        assert!(svc.verify(&tokens.access_token, TokenType::Refresh).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let tokens = service("one").issue(1, "bob").unwrap();
        let err = service("two")
            .verify(&tokens.access_token, TokenType::Access)
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service("k");
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: "1".into(),
            username: "bob".into(),
            token_type: TokenType::Access,
            jti: None,
            iat: past.timestamp(),
            exp: (past + Duration::minutes(15)).timestamp(),
        };
        let token = svc.sign(&claims).unwrap();
        assert!(svc.verify(&token, TokenType::Access).is_err());
    }

    #[test]
    fn oversized_lifetimes_are_clamped() {
        let svc = TokenService::new(&AuthConfig {
            access_token_minutes: 1_000_000_000_000,
            refresh_token_days: i64::MAX,
            ..AuthConfig::default()
        });
        let tokens = svc.issue(1, "alice").unwrap();
        assert_eq!(tokens.expires_in, MAX_ACCESS_TOKEN_MINUTES * 60);
        assert!(svc.verify(&tokens.refresh_token, TokenType::Refresh).is_ok());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(service("k").verify("not.a.jwt", TokenType::Access).is_err());
    }
}
