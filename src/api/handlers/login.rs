//! Login, logout, and access-token refresh.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::types::{ApiResponse, AuthData, LoginRequest, RefreshRequest, TokenData};
use super::{
    clear_refresh_cookie, extract_refresh_cookie, guard, missing_payload, refresh_cookie,
};
use crate::auth::{service, AuthState, PublicAccount};

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthData),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account deactivated or email unverified")
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service::login(&pool, &state, &request.email, &request.password).await {
        Ok(session) => {
            let mut headers = HeaderMap::new();
            match refresh_cookie(state.config(), &session.refresh_token) {
                Ok(cookie) => {
                    headers.insert(SET_COOKIE, cookie);
                }
                Err(err) => error!("failed to build refresh cookie: {err}"),
            }

            let body = ApiResponse::ok(
                "Login successful",
                AuthData {
                    user: PublicAccount::from(&session.account),
                    access_token: session.access_token,
                },
            );
            (StatusCode::OK, headers, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Refresh cookie cleared"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
) -> Response {
    if let Err(err) = guard::require_auth(&headers, &pool, &state).await {
        return err.into_response();
    }

    // No server-side session to destroy; expiring the cookie is the logout.
    let mut response_headers = HeaderMap::new();
    match clear_refresh_cookie(state.config()) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("failed to build clear cookie: {err}"),
    }

    (
        StatusCode::OK,
        response_headers,
        Json(ApiResponse::<()>::message("Logout successful")),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh-token",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token issued", body = TokenData),
        (status = 401, description = "Missing, invalid, or expired refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> Response {
    // Cookie first, then body, matching how clients actually send it.
    let token = extract_refresh_cookie(&headers)
        .or_else(|| payload.and_then(|Json(request)| request.refresh_token));

    match service::refresh_access_token(&pool, &state, token.as_deref()).await {
        Ok(access_token) => (
            StatusCode::OK,
            Json(ApiResponse::ok(
                "Token refreshed successfully",
                TokenData { access_token },
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
