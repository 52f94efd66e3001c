//! Email-change flow: stage, resend, and verify the new address.

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;

use super::types::{
    ApiResponse, ResendEmailUpdateRequest, UpdateEmailRequest, VerifyEmailParams,
};
use super::{guard, missing_payload, valid_email};
use crate::auth::{service, AuthError, AuthState};

#[utoipa::path(
    post,
    path = "/api/v1/auth/update-email",
    request_body = UpdateEmailRequest,
    responses(
        (status = 200, description = "New email staged; verification sent to it"),
        (status = 400, description = "Bad password or email already in use"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth"
)]
pub async fn update_email(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdateEmailRequest>>,
) -> Response {
    let principal = match guard::require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    if !valid_email(&request.email) {
        return AuthError::bad_request("Invalid email address").into_response();
    }

    match service::update_email(
        &pool,
        &state,
        principal.account.id,
        &request.email,
        &request.password,
    )
    .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::message(
                "Email update requested. Please verify new email.",
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-email-update",
    request_body = ResendEmailUpdateRequest,
    responses(
        (status = 200, description = "Verification resent to the pending address"),
        (status = 400, description = "No pending email change or bad password"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth"
)]
pub async fn resend_email_update(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResendEmailUpdateRequest>>,
) -> Response {
    let principal = match guard::require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service::resend_email_update(&pool, &state, principal.account.id, &request.password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::message(
                "Email verification resent successfully",
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/verify-new-email",
    params(VerifyEmailParams),
    responses(
        (status = 200, description = "Pending email promoted to primary"),
        (status = 400, description = "Invalid or expired verification link"),
        (status = 409, description = "Email registered by someone else meanwhile")
    ),
    tag = "auth"
)]
pub async fn verify_new_email(
    pool: Extension<PgPool>,
    params: Query<VerifyEmailParams>,
) -> Response {
    match service::verify_new_email(&pool, &params.token, &params.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::message(
                "New email verified successfully",
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::mailer;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn state() -> Arc<AuthState> {
        let config = AuthConfig::new(
            SecretString::from("access".to_string()),
            SecretString::from("refresh".to_string()),
        );
        let (mailer, _handle) = mailer::spawn_dispatcher(Arc::new(mailer::LogEmailSender), 4);
        Arc::new(AuthState::new(config, mailer))
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn update_email_requires_auth() {
        let response = update_email(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(state()),
            Some(Json(UpdateEmailRequest {
                email: "new@example.com".to_string(),
                password: "secret1".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn resend_email_update_requires_auth() {
        let response = resend_email_update(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(state()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
