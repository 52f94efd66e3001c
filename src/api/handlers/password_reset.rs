//! Password-reset flow: OTP request, OTP verification, reset.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;

use super::missing_payload;
use super::types::{
    ApiResponse, ForgotPasswordRequest, ResendOtpRequest, ResetPasswordRequest, ResetTokenData,
    VerifyOtpRequest,
};
use crate::auth::{service, AuthState};

#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "OTP generated and emailed"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service::request_password_reset(&pool, &state, &request.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::message(
                "Password reset OTP sent to email",
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "OTP verified, reset token issued", body = ResetTokenData),
        (status = 400, description = "No OTP request found / OTP expired / Invalid OTP"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service::verify_otp(&pool, &state, &request.email, &request.otp).await {
        Ok(token) => (
            StatusCode::OK,
            Json(ApiResponse::ok(
                "OTP verified successfully",
                ResetTokenData { token },
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-otp",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "Fresh OTP generated and emailed"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
)]
pub async fn resend_otp(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResendOtpRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service::resend_otp(&pool, &state, &request.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::message("OTP resent successfully")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced, token invalidated"),
        (status = 400, description = "Invalid or expired token")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service::reset_password(&pool, &state, &request.token, &request.new_password).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::message("Password reset successful")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
