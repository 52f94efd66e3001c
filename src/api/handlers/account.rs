//! Authenticated account endpoints: profile, current user, password change.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;

use super::types::{ApiResponse, ChangePasswordRequest, UpdateProfileRequest};
use super::{guard, missing_payload};
use crate::auth::store::ProfileUpdate;
use crate::auth::{service, AuthState, PublicAccount};

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current account", body = PublicAccount),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
) -> Response {
    let principal = match guard::require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    match service::get_account(&pool, principal.account.id).await {
        Ok(account) => (
            StatusCode::OK,
            Json(ApiResponse::ok(
                "User retrieved successfully",
                PublicAccount::from(&account),
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = PublicAccount),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth"
)]
pub async fn update_profile(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdateProfileRequest>>,
) -> Response {
    let principal = match guard::require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let update = ProfileUpdate {
        first_name: request.first_name,
        last_name: request.last_name,
        phone: request.phone,
        location: request.location,
    };

    match service::update_profile(&pool, principal.account.id, update).await {
        Ok(account) => (
            StatusCode::OK,
            Json(ApiResponse::ok(
                "Profile updated successfully",
                PublicAccount::from(&account),
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Current password is incorrect"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth"
)]
pub async fn change_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> Response {
    let principal = match guard::require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service::change_password(
        &pool,
        &state,
        principal.account.id,
        &request.current_password,
        &request.new_password,
    )
    .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::message("Password changed successfully")),
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
    async fn me_requires_auth() {
        let response = me(HeaderMap::new(), Extension(lazy_pool()), Extension(state()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn update_profile_requires_auth() {
        let response = update_profile(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(state()),
            Some(Json(UpdateProfileRequest::default())),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
