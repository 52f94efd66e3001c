//! Signed session tokens.
//!
//! Two independent secret/TTL pairs: short-lived access tokens authorize
//! individual requests, long-lived refresh tokens only mint new access
//! tokens. Claims carry enough identity to authorize without a store
//! lookup, though sensitive paths still re-fetch the account.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::account::{Account, Role};
use super::config::AuthConfig;

/// Identity claims embedded in both token kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Verification failure. Both kinds are non-retryable; the split only
/// drives caller-facing messaging.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

struct TokenKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKey {
    fn new(secret: &[u8], ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::seconds(ttl_seconds),
        }
    }
}

pub struct TokenIssuer {
    access: TokenKey,
    refresh: TokenKey,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access: TokenKey::new(
                config.access_token_secret().expose_secret().as_bytes(),
                config.access_token_ttl_seconds(),
            ),
            refresh: TokenKey::new(
                config.refresh_token_secret().expose_secret().as_bytes(),
                config.refresh_token_ttl_seconds(),
            ),
        }
    }

    pub fn issue_access(&self, account: &Account) -> Result<String> {
        Self::issue(&self.access, account)
    }

    pub fn issue_refresh(&self, account: &Account) -> Result<String> {
        Self::issue(&self.refresh, account)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(&self.access, token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(&self.refresh, token)
    }

    fn issue(key: &TokenKey, account: &Account) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            role: account.role,
            iat: now.timestamp(),
            exp: (now + key.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &key.encoding)
            .context("failed to sign token")
    }

    fn verify(key: &TokenKey, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &key.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("access-secret".to_string()),
            SecretString::from("refresh-secret".to_string()),
        )
    }

    fn account() -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::Driver,
            phone: None,
            location: None,
            is_active: true,
            is_email_verified: true,
            last_login_at: None,
            reset_otp: None,
            reset_otp_expires_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            verification_token: None,
            verification_expires_at: None,
            pending_email: None,
            email_change_token: None,
            email_change_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let issuer = TokenIssuer::new(&config());
        let account = account();

        let token = issuer.issue_access(&account).expect("issue");
        assert_eq!(token.matches('.').count(), 2, "JWT-shaped string");

        let claims = issuer.verify_access(&token).expect("verify");
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.email, account.email);
        assert_eq!(claims.role, Role::Driver);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let issuer = TokenIssuer::new(&config());
        let account = account();

        let refresh = issuer.issue_refresh(&account).expect("issue");
        assert_eq!(issuer.verify_access(&refresh), Err(TokenError::Invalid));
        assert!(issuer.verify_refresh(&refresh).is_ok());
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let issuer = TokenIssuer::new(&config());
        let other = TokenIssuer::new(&AuthConfig::new(
            SecretString::from("different".to_string()),
            SecretString::from("also different".to_string()),
        ));

        let token = issuer.issue_access(&account()).expect("issue");
        assert_eq!(other.verify_access(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_reports_expired() {
        let issuer = TokenIssuer::new(&config().with_access_token_ttl_seconds(-60));
        let token = issuer.issue_access(&account()).expect("issue");
        assert_eq!(issuer.verify_access(&token), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_is_invalid() {
        let issuer = TokenIssuer::new(&config());
        assert_eq!(
            issuer.verify_access("not-a-token"),
            Err(TokenError::Invalid)
        );
    }
}
