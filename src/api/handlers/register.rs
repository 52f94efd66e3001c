//! Registration endpoint.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::types::{ApiResponse, AuthData, RegisterRequest};
use super::{missing_payload, refresh_cookie, valid_email};
use crate::auth::service::{self, NewRegistration};
use crate::auth::{AuthError, AuthState, PublicAccount};

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, tokens issued", body = AuthData),
        (status = 400, description = "Missing or malformed payload"),
        (status = 409, description = "Email already in use")
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    if !valid_email(&request.email) {
        return AuthError::bad_request("Invalid email address").into_response();
    }

    let input = NewRegistration {
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email,
        password: request.password,
        role: request.role,
        phone: request.phone,
        location: request.location,
    };

    match service::register(&pool, &state, input).await {
        Ok(session) => {
            let mut headers = HeaderMap::new();
            match refresh_cookie(state.config(), &session.refresh_token) {
                Ok(cookie) => {
                    headers.insert(SET_COOKIE, cookie);
                }
                Err(err) => error!("failed to build refresh cookie: {err}"),
            }

            let body = ApiResponse::ok(
                "User registered successfully",
                AuthData {
                    user: PublicAccount::from(&session.account),
                    access_token: session.access_token,
                },
            );
            (StatusCode::CREATED, headers, Json(body)).into_response()
        }
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
    async fn register_missing_payload() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let response = register(Extension(pool), Extension(state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let response = register(
            Extension(pool),
            Extension(state()),
            Some(Json(RegisterRequest {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "not-an-email".to_string(),
                password: "secret1".to_string(),
                role: crate::auth::Role::Buyer,
                phone: None,
                location: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
