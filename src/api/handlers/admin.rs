//! Privileged administration endpoints.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{ApiResponse, SetPasswordRequest};
use super::{guard, missing_payload};
use crate::auth::{service, AuthState, Role};

#[utoipa::path(
    post,
    path = "/api/v1/auth/set-password/{account_id}",
    request_body = SetPasswordRequest,
    params(
        ("account_id" = Uuid, Path, description = "Account to set the password for")
    ),
    responses(
        (status = 200, description = "Password set"),
        (status = 403, description = "Caller is not a manager"),
        (status = 404, description = "User not found")
    ),
    tag = "admin"
)]
pub async fn set_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    Path(account_id): Path<Uuid>,
    payload: Option<Json<SetPasswordRequest>>,
) -> Response {
    let principal = match guard::require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    // No current-password check on this path; the role gate is the control.
    if let Err(err) = guard::authorize(&principal, &[Role::Manager]) {
        return err.into_response();
    }

    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service::set_password(&pool, &state, account_id, &request.password).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::message("Password set successfully")),
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

    #[tokio::test]
    async fn set_password_requires_auth() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let response = set_password(
            HeaderMap::new(),
            Extension(pool),
            Extension(state()),
            Path(Uuid::new_v4()),
            Some(Json(SetPasswordRequest {
                password: "new-password".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
