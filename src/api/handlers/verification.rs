//! Email verification endpoints.

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;

use super::guard;
use super::types::{ApiResponse, VerifyEmailParams};
use crate::auth::{service, AuthState};

#[utoipa::path(
    get,
    path = "/api/v1/auth/verify-email",
    params(VerifyEmailParams),
    responses(
        (status = 200, description = "Email verified"),
        (status = 400, description = "Invalid or expired verification link")
    ),
    tag = "auth"
)]
pub async fn verify_email(
    pool: Extension<PgPool>,
    params: Query<VerifyEmailParams>,
) -> Response {
    match service::verify_email(&pool, &params.token, &params.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::message("Email verified successfully")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-verification",
    responses(
        (status = 200, description = "Verification email resent"),
        (status = 400, description = "Email is already verified"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
) -> Response {
    let principal = match guard::require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    match service::resend_verification(&pool, &state, &principal.account.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::message(
                "Verification email resent successfully",
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
