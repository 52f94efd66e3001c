//! Authorization gate for bearer-token routes.
//!
//! Token claims are enough to identify the caller, but they go stale: the
//! gate re-fetches the account on every authenticated request and rejects
//! deactivated accounts and role drift before any handler runs. Role
//! allow-lists sit on top for the privileged routes.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use sqlx::PgPool;

use crate::auth::tokens::{Claims, TokenError};
use crate::auth::{store, Account, AuthError, AuthState, Role};

/// Authenticated caller context: the live account plus the claims it
/// authenticated with.
pub struct Principal {
    pub account: Account,
    pub claims: Claims,
}

/// Resolve the bearer token into a principal or fail with the specific
/// authentication error.
pub async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<Principal, AuthError> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(AuthError::unauthorized(
            "Authentication failed: No token provided",
        ));
    };

    let claims = state.tokens().verify_access(&token).map_err(|err| match err {
        TokenError::Expired => AuthError::unauthorized("Authentication failed: Token expired"),
        TokenError::Invalid => AuthError::unauthorized("Authentication failed: Invalid token"),
    })?;

    let Some(account) = store::find_by_id(pool, claims.sub).await? else {
        return Err(AuthError::not_found("Authentication failed: User not found"));
    };

    if !account.is_active {
        return Err(AuthError::unauthorized(
            "Authentication failed: Your account has been deactivated. Please contact support.",
        ));
    }

    // Claims go stale; the live role wins.
    if account.role != claims.role {
        return Err(AuthError::forbidden(
            "Authentication failed: Role mismatch. Please login again.",
        ));
    }

    Ok(Principal { account, claims })
}

/// Role allow-list check for privileged routes.
pub fn authorize(principal: &Principal, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&principal.account.role) {
        Ok(())
    } else {
        Err(AuthError::forbidden("Forbidden"))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use uuid::Uuid;

    fn account(role: Role) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role,
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

    fn principal(role: Role) -> Principal {
        let account = account(role);
        let claims = Claims {
            sub: account.id,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            role,
            iat: 0,
            exp: i64::MAX,
        };
        Principal { account, claims }
    }

    #[test]
    fn extract_bearer_token_strips_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(
            extract_bearer_token(&headers),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn extract_bearer_token_accepts_lowercase_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer token"));
        assert_eq!(extract_bearer_token(&headers), Some("token".to_string()));
    }

    #[test]
    fn extract_bearer_token_rejects_other_schemes_and_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn authorize_allows_listed_roles() {
        let manager = principal(Role::Manager);
        assert!(authorize(&manager, &[Role::Manager]).is_ok());
        assert!(authorize(&manager, &[Role::Manager, Role::Treasurer]).is_ok());
    }

    #[test]
    fn authorize_rejects_unlisted_roles() {
        let buyer = principal(Role::Buyer);
        let err = authorize(&buyer, &[Role::Manager]).expect_err("forbidden");
        assert!(matches!(err, AuthError::Forbidden(_)));
    }
}
