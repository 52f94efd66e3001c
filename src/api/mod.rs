//! HTTP server bootstrap and routing.

pub mod handlers;
mod openapi;

pub use openapi::ApiDoc;

use crate::auth::{seed, store, AuthConfig, AuthState};
use crate::mailer::{self, EmailSender, HttpEmailSender, LogEmailSender};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, patch, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa::OpenApi as _;
use utoipa_swagger_ui::SwaggerUi;

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, config: AuthConfig) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    store::ensure_schema(&pool).await?;

    // Seeding failures are logged, not fatal; the API can still serve.
    if let Err(err) = seed::seed_manager(&pool, &config).await {
        error!("Failed to seed manager account: {err:#}");
    }

    let sender: Arc<dyn EmailSender> = match config.mail_api_url() {
        Some(endpoint) => Arc::new(HttpEmailSender::new(
            endpoint.to_string(),
            config.mail_api_token().cloned(),
        )?),
        None => Arc::new(LogEmailSender),
    };
    let (mail, _dispatcher) = mailer::spawn_dispatcher(sender, config.mail_queue_capacity());

    let client_origin = client_origin(config.client_url())?;
    let state = Arc::new(AuthState::new(config, mail));

    // Credentials are allowed because the refresh token rides in a cookie.
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_origin(AllowOrigin::exact(client_origin))
        .allow_credentials(true);

    let app = router().layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors)
            .layer(Extension(state))
            .layer(Extension(pool)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn router() -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/v1/auth/register", post(handlers::register::register))
        .route("/api/v1/auth/login", post(handlers::login::login))
        .route("/api/v1/auth/logout", post(handlers::login::logout))
        .route(
            "/api/v1/auth/refresh-token",
            post(handlers::login::refresh),
        )
        .route(
            "/api/v1/auth/verify-email",
            get(handlers::verification::verify_email),
        )
        .route(
            "/api/v1/auth/resend-verification",
            post(handlers::verification::resend_verification),
        )
        .route(
            "/api/v1/auth/forgot-password",
            post(handlers::password_reset::forgot_password),
        )
        .route(
            "/api/v1/auth/verify-otp",
            post(handlers::password_reset::verify_otp),
        )
        .route(
            "/api/v1/auth/resend-otp",
            post(handlers::password_reset::resend_otp),
        )
        .route(
            "/api/v1/auth/reset-password",
            post(handlers::password_reset::reset_password),
        )
        .route("/api/v1/auth/me", get(handlers::account::me))
        .route(
            "/api/v1/auth/profile",
            patch(handlers::account::update_profile),
        )
        .route(
            "/api/v1/auth/change-password",
            post(handlers::account::change_password),
        )
        .route(
            "/api/v1/auth/update-email",
            post(handlers::email_change::update_email),
        )
        .route(
            "/api/v1/auth/resend-email-update",
            post(handlers::email_change::resend_email_update),
        )
        .route(
            "/api/v1/auth/verify-new-email",
            get(handlers::email_change::verify_new_email),
        )
        .route(
            "/api/v1/auth/set-password/:account_id",
            post(handlers::admin::set_password),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn client_origin(client_url: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(client_url).with_context(|| format!("Invalid client URL: {client_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Client URL must include a valid host: {client_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build client origin header")
}
