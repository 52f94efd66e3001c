//! HTTP handlers and shared plumbing.
//!
//! Handlers stay thin: extract the payload, call the lifecycle service, and
//! wrap the result in the response envelope. All state transitions live in
//! `crate::auth::service`.

pub mod account;
pub mod admin;
pub mod email_change;
pub mod guard;
pub mod health;
pub mod login;
pub mod password_reset;
pub mod register;
pub mod types;
pub mod verification;

use axum::{
    http::{
        header::{InvalidHeaderValue, COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use tracing::error;

use crate::auth::{AuthConfig, AuthError};
use types::ApiResponse;

/// Cookie carrying the refresh token. Clients depend on this exact shape;
/// changing any attribute logs everyone out.
pub(crate) const REFRESH_COOKIE_NAME: &str = "refreshToken";

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Internal(err) => {
                error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<()>::failure("Internal server error")),
                )
                    .into_response()
            }
            other => {
                let status = other.status_code();
                (status, Json(ApiResponse::<()>::failure(other.to_string()))).into_response()
            }
        }
    }
}

pub(crate) fn missing_payload() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::failure("Missing payload")),
    )
        .into_response()
}

/// Build the `Set-Cookie` value for a freshly issued refresh token.
pub(crate) fn refresh_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.refresh_token_ttl_seconds();
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}"
    );
    if config.production() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Expire the refresh cookie on logout.
pub(crate) fn clear_refresh_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{REFRESH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if config.production() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Read the refresh token back out of the request cookies.
pub(crate) fn extract_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == REFRESH_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("access".to_string()),
            SecretString::from("refresh".to_string()),
        )
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn refresh_cookie_dev_shape_is_exact() {
        let cookie = refresh_cookie(&config(), "tok").expect("cookie");
        assert_eq!(
            cookie.to_str().ok(),
            Some("refreshToken=tok; Path=/; HttpOnly; SameSite=Strict; Max-Age=2592000")
        );
    }

    #[test]
    fn refresh_cookie_production_appends_secure() {
        let cookie = refresh_cookie(&config().with_production(true), "tok").expect("cookie");
        assert_eq!(
            cookie.to_str().ok(),
            Some("refreshToken=tok; Path=/; HttpOnly; SameSite=Strict; Max-Age=2592000; Secure")
        );
    }

    #[test]
    fn clear_refresh_cookie_zeroes_max_age() {
        let cookie = clear_refresh_cookie(&config()).expect("cookie");
        assert_eq!(
            cookie.to_str().ok(),
            Some("refreshToken=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
        );
    }

    #[test]
    fn extract_refresh_cookie_finds_the_right_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=abc123; other=1"),
        );
        assert_eq!(extract_refresh_cookie(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn extract_refresh_cookie_none_when_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(extract_refresh_cookie(&headers), None);
        assert_eq!(extract_refresh_cookie(&HeaderMap::new()), None);
    }
}
