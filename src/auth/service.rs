//! Account lifecycle service.
//!
//! Each operation runs its precondition checks in order and aborts on the
//! first failure; nothing is committed on a failure path. Store writes that
//! consume a one-time secret are single atomic statements, so a lost race
//! between two concurrent requests on the same account resolves to
//! last-write-wins at the store (deliberately; see DESIGN.md). Email
//! dispatch is fire-and-forget: a dropped message never rolls back a state
//! change that already landed.

use sqlx::PgPool;
use uuid::Uuid;

use super::account::{Account, Role};
use super::error::AuthError;
use super::store::{self, CreateOutcome, EmailPromotion, NewAccount, ProfileUpdate};
use super::{password, secrets, AuthState};
use crate::mailer::{templates, EmailMessage};
use chrono::{Duration, Utc};

/// Result of an operation that signs the caller in.
pub struct AuthSession {
    pub account: Account,
    pub access_token: String,
    pub refresh_token: String,
}

/// Registration input, already shape-validated at the boundary.
pub struct NewRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub location: Option<String>,
}

/// Create an account (active, unverified), issue both tokens, and send the
/// verification + welcome emails.
pub async fn register(
    pool: &PgPool,
    state: &AuthState,
    input: NewRegistration,
) -> Result<AuthSession, AuthError> {
    if store::email_in_use(pool, &input.email).await? {
        return Err(AuthError::conflict("Email already in use"));
    }

    let password_hash = password::hash(input.password, state.config().hash_time_cost()).await?;
    let verification = secrets::opaque_token_with_ttl(Duration::hours(
        state.config().verification_ttl_hours(),
    ))?;

    let outcome = store::create(
        pool,
        &NewAccount {
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            password_hash,
            role: input.role,
            phone: input.phone,
            location: input.location,
            is_email_verified: false,
            verification: Some(verification.clone()),
        },
    )
    .await?;

    let account = match outcome {
        CreateOutcome::Created(account) => *account,
        // The unique index caught a concurrent registration.
        CreateOutcome::DuplicateEmail => return Err(AuthError::conflict("Email already in use")),
    };

    let access_token = state.tokens().issue_access(&account)?;
    let refresh_token = state.tokens().issue_refresh(&account)?;

    let link = verify_email_url(state.config().client_url(), &account.email, &verification.value);
    let (subject, html_body) = templates::verification(&account.first_name, &link);
    state.mailer().dispatch(EmailMessage {
        to: account.email.clone(),
        subject,
        html_body,
    });
    let (subject, html_body) = templates::welcome(&account.first_name);
    state.mailer().dispatch(EmailMessage {
        to: account.email.clone(),
        subject,
        html_body,
    });

    Ok(AuthSession {
        account,
        access_token,
        refresh_token,
    })
}

/// Authenticate and issue a fresh token pair.
///
/// Unknown email and wrong password share one message so callers cannot
/// enumerate accounts.
pub async fn login(
    pool: &PgPool,
    state: &AuthState,
    email: &str,
    submitted_password: &str,
) -> Result<AuthSession, AuthError> {
    let Some(account) = store::find_by_email(pool, email).await? else {
        return Err(AuthError::unauthorized("Invalid credentials"));
    };

    let matches = password::verify(
        submitted_password.to_string(),
        account.password_hash.clone(),
    )
    .await?;
    if !matches {
        return Err(AuthError::unauthorized("Invalid credentials"));
    }

    if !account.is_active {
        return Err(AuthError::forbidden("Account is deactivated"));
    }

    if !account.is_email_verified {
        return Err(AuthError::forbidden("Email is not verified"));
    }

    store::update_last_login(pool, account.id).await?;

    let access_token = state.tokens().issue_access(&account)?;
    let refresh_token = state.tokens().issue_refresh(&account)?;

    Ok(AuthSession {
        account,
        access_token,
        refresh_token,
    })
}

/// Consume an email-verification token. Wrong token, wrong email, and
/// expired token are indistinguishable by design.
pub async fn verify_email(pool: &PgPool, token: &str, email: &str) -> Result<(), AuthError> {
    if store::consume_verification_token(pool, email, token).await? {
        Ok(())
    } else {
        Err(AuthError::bad_request(
            "Invalid or expired verification link",
        ))
    }
}

/// Rotate the verification token and resend the email.
pub async fn resend_verification(
    pool: &PgPool,
    state: &AuthState,
    email: &str,
) -> Result<(), AuthError> {
    let Some(account) = store::find_by_email(pool, email).await? else {
        return Err(AuthError::not_found("User not found"));
    };

    if account.is_email_verified {
        return Err(AuthError::bad_request("Email is already verified"));
    }

    let verification = secrets::opaque_token_with_ttl(Duration::hours(
        state.config().verification_ttl_hours(),
    ))?;
    store::set_verification_token(pool, account.id, &verification).await?;

    let link = verify_email_url(state.config().client_url(), &account.email, &verification.value);
    let (subject, html_body) = templates::verification(&account.first_name, &link);
    state.mailer().dispatch(EmailMessage {
        to: account.email.clone(),
        subject,
        html_body,
    });

    Ok(())
}

/// Mint a new access token from a refresh token. The refresh token itself
/// is not rotated. Every failure collapses into one generic message.
pub async fn refresh_access_token(
    pool: &PgPool,
    state: &AuthState,
    refresh_token: Option<&str>,
) -> Result<String, AuthError> {
    let Some(refresh_token) = refresh_token else {
        return Err(AuthError::unauthorized("Refresh token required"));
    };

    let claims = state
        .tokens()
        .verify_refresh(refresh_token)
        .map_err(|_| AuthError::unauthorized("Invalid refresh token"))?;

    let Some(account) = store::find_by_id(pool, claims.sub).await? else {
        return Err(AuthError::unauthorized("Invalid refresh token"));
    };

    Ok(state.tokens().issue_access(&account)?)
}

/// Generate and store a reset OTP, then send it out-of-band.
pub async fn request_password_reset(
    pool: &PgPool,
    state: &AuthState,
    email: &str,
) -> Result<(), AuthError> {
    let Some(account) = store::find_by_email(pool, email).await? else {
        return Err(AuthError::not_found("User not found"));
    };

    let otp = secrets::numeric_code(
        state.config().otp_digits(),
        Duration::minutes(state.config().otp_ttl_minutes()),
    );
    store::set_reset_otp(pool, account.id, &otp).await?;

    let (subject, html_body) = templates::otp(Some(&account.first_name), &otp.value);
    state.mailer().dispatch(EmailMessage {
        to: account.email.clone(),
        subject,
        html_body,
    });

    Ok(())
}

/// Exchange a live OTP for a single-use reset token.
///
/// Distinct messages for the three failure cases; a failed check never
/// clears or rotates the stored OTP.
pub async fn verify_otp(
    pool: &PgPool,
    state: &AuthState,
    email: &str,
    otp: &str,
) -> Result<String, AuthError> {
    let Some(account) = store::find_by_email(pool, email).await? else {
        return Err(AuthError::not_found("User not found"));
    };

    let (Some(stored_otp), Some(expires_at)) = (&account.reset_otp, account.reset_otp_expires_at)
    else {
        return Err(AuthError::bad_request("No OTP request found"));
    };

    if expires_at <= Utc::now() {
        return Err(AuthError::bad_request("OTP expired"));
    }

    if stored_otp != otp {
        return Err(AuthError::bad_request("Invalid OTP"));
    }

    let reset = secrets::opaque_token_with_ttl(Duration::minutes(
        state.config().reset_token_ttl_minutes(),
    ))?;
    // One statement stores the token and clears the spent OTP pair.
    store::store_reset_token(pool, account.id, &reset).await?;

    Ok(reset.value)
}

/// Overwrite any previous OTP with a fresh one and resend it.
pub async fn resend_otp(pool: &PgPool, state: &AuthState, email: &str) -> Result<(), AuthError> {
    let Some(account) = store::find_by_email(pool, email).await? else {
        return Err(AuthError::not_found("User not found"));
    };

    let otp = secrets::numeric_code(
        state.config().otp_digits(),
        Duration::minutes(state.config().otp_ttl_minutes()),
    );
    store::set_reset_otp(pool, account.id, &otp).await?;

    let (subject, html_body) = templates::otp(Some(&account.first_name), &otp.value);
    state.mailer().dispatch(EmailMessage {
        to: account.email.clone(),
        subject,
        html_body,
    });

    Ok(())
}

/// Set a new password through a live reset token, invalidating the token.
pub async fn reset_password(
    pool: &PgPool,
    state: &AuthState,
    token: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    let Some(account) = store::find_by_reset_token(pool, token).await? else {
        return Err(AuthError::bad_request("Invalid or expired token"));
    };

    let password_hash =
        password::hash(new_password.to_string(), state.config().hash_time_cost()).await?;
    store::reset_password(pool, account.id, &password_hash).await?;

    Ok(())
}

pub async fn get_account(pool: &PgPool, id: Uuid) -> Result<Account, AuthError> {
    store::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AuthError::not_found("User not found"))
}

/// Partial update of name, phone, and location.
pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    update: ProfileUpdate,
) -> Result<Account, AuthError> {
    store::update_profile(pool, id, &update)
        .await?
        .ok_or_else(|| AuthError::not_found("User not found"))
}

/// Change the password after re-proving the current one.
pub async fn change_password(
    pool: &PgPool,
    state: &AuthState,
    id: Uuid,
    current_password: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    let Some(account) = store::find_by_id(pool, id).await? else {
        return Err(AuthError::not_found("User not found"));
    };

    let matches = password::verify(
        current_password.to_string(),
        account.password_hash.clone(),
    )
    .await?;
    if !matches {
        return Err(AuthError::bad_request("Current password is incorrect"));
    }

    let password_hash =
        password::hash(new_password.to_string(), state.config().hash_time_cost()).await?;
    store::set_password_hash(pool, account.id, &password_hash).await?;

    Ok(())
}

/// Stage a new email address. Verification goes to the NEW address only, so
/// a stolen session cannot silently move the account to an inbox the
/// attacker does not control.
pub async fn update_email(
    pool: &PgPool,
    state: &AuthState,
    id: Uuid,
    new_email: &str,
    submitted_password: &str,
) -> Result<(), AuthError> {
    let Some(account) = store::find_by_id(pool, id).await? else {
        return Err(AuthError::not_found("User not found"));
    };

    let matches = password::verify(
        submitted_password.to_string(),
        account.password_hash.clone(),
    )
    .await?;
    if !matches {
        return Err(AuthError::bad_request("Password is incorrect"));
    }

    if store::email_in_use(pool, new_email).await? {
        return Err(AuthError::bad_request("Email already in use"));
    }

    let secret = secrets::opaque_token_with_ttl(Duration::hours(
        state.config().email_change_ttl_hours(),
    ))?;
    store::stage_email_change(pool, account.id, new_email, &secret).await?;

    let link = verify_new_email_url(state.config().client_url(), new_email, &secret.value);
    let (subject, html_body) = templates::email_change(&account.first_name, &link);
    state.mailer().dispatch(EmailMessage {
        to: new_email.to_string(),
        subject,
        html_body,
    });

    Ok(())
}

/// Rotate the email-change token for an existing pending address.
pub async fn resend_email_update(
    pool: &PgPool,
    state: &AuthState,
    id: Uuid,
    submitted_password: &str,
) -> Result<(), AuthError> {
    let Some(account) = store::find_by_id(pool, id).await? else {
        return Err(AuthError::not_found("User not found"));
    };

    let Some(pending_email) = account.pending_email.clone() else {
        return Err(AuthError::bad_request("No pending email change"));
    };

    let matches = password::verify(
        submitted_password.to_string(),
        account.password_hash.clone(),
    )
    .await?;
    if !matches {
        return Err(AuthError::bad_request("Password is incorrect"));
    }

    let secret = secrets::opaque_token_with_ttl(Duration::hours(
        state.config().email_change_ttl_hours(),
    ))?;
    store::stage_email_change(pool, account.id, &pending_email, &secret).await?;

    let link = verify_new_email_url(state.config().client_url(), &pending_email, &secret.value);
    let (subject, html_body) = templates::email_change(&account.first_name, &link);
    state.mailer().dispatch(EmailMessage {
        to: pending_email,
        subject,
        html_body,
    });

    Ok(())
}

/// Promote a staged email to primary once the new address proves receipt.
pub async fn verify_new_email(pool: &PgPool, token: &str, email: &str) -> Result<(), AuthError> {
    match store::promote_pending_email(pool, email, token).await? {
        EmailPromotion::Promoted => Ok(()),
        EmailPromotion::NoMatch => Err(AuthError::bad_request(
            "Invalid or expired verification link",
        )),
        EmailPromotion::EmailTaken => Err(AuthError::conflict("Email already in use")),
    }
}

/// Administrative password set; the role gate is enforced at the boundary.
pub async fn set_password(
    pool: &PgPool,
    state: &AuthState,
    account_id: Uuid,
    new_password: &str,
) -> Result<(), AuthError> {
    let Some(account) = store::find_by_id(pool, account_id).await? else {
        return Err(AuthError::not_found("User not found"));
    };

    let password_hash =
        password::hash(new_password.to_string(), state.config().hash_time_cost()).await?;
    store::set_password_hash(pool, account.id, &password_hash).await?;

    Ok(())
}

fn verify_email_url(client_url: &str, email: &str, token: &str) -> String {
    let base = client_url.trim_end_matches('/');
    format!("{base}/verify-email?token={token}&email={email}")
}

fn verify_new_email_url(client_url: &str, email: &str, token: &str) -> String {
    let base = client_url.trim_end_matches('/');
    format!("{base}/verify-new-email?token={token}&email={email}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_email_url_trims_trailing_slash() {
        let url = verify_email_url("https://app.test/", "a@x.com", "token");
        assert_eq!(url, "https://app.test/verify-email?token=token&email=a@x.com");
    }

    #[test]
    fn verify_new_email_url_points_at_new_email_route() {
        let url = verify_new_email_url("https://app.test", "b@x.com", "token");
        assert_eq!(
            url,
            "https://app.test/verify-new-email?token=token&email=b@x.com"
        );
    }
}
