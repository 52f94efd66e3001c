//! Store gateway for account records.
//!
//! The only module that touches the `accounts` table. Lookups that involve a
//! one-time secret bake the expiry filter into the query, and every consume
//! clears the secret and its expiry in the same statement, so no caller can
//! observe a half-cleared pair. All operations are single-row atomic; there
//! are no multi-row transactions here.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::account::{Account, Role};
use super::secrets::GeneratedSecret;

pub(crate) const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS accounts (
    id UUID PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    phone TEXT,
    location TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    is_email_verified BOOLEAN NOT NULL DEFAULT FALSE,
    last_login_at TIMESTAMPTZ,
    reset_otp TEXT,
    reset_otp_expires_at TIMESTAMPTZ,
    reset_token TEXT,
    reset_token_expires_at TIMESTAMPTZ,
    verification_token TEXT,
    verification_expires_at TIMESTAMPTZ,
    pending_email TEXT,
    email_change_token TEXT,
    email_change_expires_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX IF NOT EXISTS accounts_email_idx ON accounts (email);
CREATE INDEX IF NOT EXISTS accounts_role_idx ON accounts (role);
CREATE INDEX IF NOT EXISTS accounts_reset_token_idx ON accounts (reset_token);
CREATE INDEX IF NOT EXISTS accounts_email_change_token_idx ON accounts (email_change_token);
";

const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, email, password_hash, role, phone, \
     location, is_active, is_email_verified, last_login_at, reset_otp, reset_otp_expires_at, \
     reset_token, reset_token_expires_at, verification_token, verification_expires_at, \
     pending_email, email_change_token, email_change_expires_at, created_at, updated_at";

/// Fields needed to create an account row.
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub is_email_verified: bool,
    pub verification: Option<GeneratedSecret>,
}

/// Outcome of an insert attempt; the unique index is the backstop for the
/// application-level duplicate check.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Box<Account>),
    DuplicateEmail,
}

/// Outcome of promoting a staged email to primary.
#[derive(Debug, PartialEq, Eq)]
pub enum EmailPromotion {
    Promoted,
    NoMatch,
    EmailTaken,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

/// Create the schema if this is a fresh database.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .context("failed to ensure accounts schema")?;
    Ok(())
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up account by email")?;

    row.as_ref().map(account_from_row).transpose()
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up account by id")?;

    row.as_ref().map(account_from_row).transpose()
}

/// Look up an account by a live (unexpired) password-reset token.
pub async fn find_by_reset_token(pool: &PgPool, token: &str) -> Result<Option<Account>> {
    let query = format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts \
         WHERE reset_token = $1 AND reset_token_expires_at > NOW()"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(token)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up account by reset token")?;

    row.as_ref().map(account_from_row).transpose()
}

pub async fn email_in_use(pool: &PgPool, email: &str) -> Result<bool> {
    let query = "SELECT 1 FROM accounts WHERE email = $1 LIMIT 1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check email availability")?;
    Ok(row.is_some())
}

pub async fn manager_exists(pool: &PgPool) -> Result<bool> {
    let query = "SELECT 1 FROM accounts WHERE role = $1 LIMIT 1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(Role::Manager.as_str())
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check for manager account")?;
    Ok(row.is_some())
}

pub async fn create(pool: &PgPool, account: &NewAccount) -> Result<CreateOutcome> {
    let query = format!(
        "INSERT INTO accounts \
            (id, first_name, last_name, email, password_hash, role, phone, location, \
             is_email_verified, verification_token, verification_expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {ACCOUNT_COLUMNS}"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(Uuid::new_v4())
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(&account.phone)
        .bind(&account.location)
        .bind(account.is_email_verified)
        .bind(account.verification.as_ref().map(|secret| &secret.value))
        .bind(account.verification.as_ref().map(|secret| secret.expires_at))
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(CreateOutcome::Created(Box::new(account_from_row(&row)?))),
        Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::DuplicateEmail),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<()> {
    let query = "UPDATE accounts SET last_login_at = NOW(), updated_at = NOW() WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update last login")?;
    Ok(())
}

/// Store (or rotate) the email-verification secret.
pub async fn set_verification_token(
    pool: &PgPool,
    id: Uuid,
    secret: &GeneratedSecret,
) -> Result<()> {
    let query = "UPDATE accounts \
         SET verification_token = $2, verification_expires_at = $3, updated_at = NOW() \
         WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .bind(&secret.value)
        .bind(secret.expires_at)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store verification token")?;
    Ok(())
}

/// Mark the email verified if the token matches and is still live.
/// Consuming the token and clearing the pair is one atomic statement.
pub async fn consume_verification_token(pool: &PgPool, email: &str, token: &str) -> Result<bool> {
    let query = "UPDATE accounts \
         SET is_email_verified = TRUE, verification_token = NULL, \
             verification_expires_at = NULL, updated_at = NOW() \
         WHERE email = $1 AND verification_token = $2 AND verification_expires_at > NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(email)
        .bind(token)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to consume verification token")?;
    Ok(result.rows_affected() > 0)
}

/// Store (or overwrite) the password-reset OTP.
pub async fn set_reset_otp(pool: &PgPool, id: Uuid, secret: &GeneratedSecret) -> Result<()> {
    let query = "UPDATE accounts \
         SET reset_otp = $2, reset_otp_expires_at = $3, updated_at = NOW() \
         WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .bind(&secret.value)
        .bind(secret.expires_at)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store reset OTP")?;
    Ok(())
}

/// Store the post-OTP reset token; the consumed OTP pair is cleared in the
/// same statement.
pub async fn store_reset_token(pool: &PgPool, id: Uuid, secret: &GeneratedSecret) -> Result<()> {
    let query = "UPDATE accounts \
         SET reset_token = $2, reset_token_expires_at = $3, \
             reset_otp = NULL, reset_otp_expires_at = NULL, updated_at = NOW() \
         WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .bind(&secret.value)
        .bind(secret.expires_at)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store reset token")?;
    Ok(())
}

/// Store the new digest and invalidate the reset token that allowed it.
pub async fn reset_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<()> {
    let query = "UPDATE accounts \
         SET password_hash = $2, reset_token = NULL, reset_token_expires_at = NULL, \
             updated_at = NOW() \
         WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to reset password")?;
    Ok(())
}

pub async fn set_password_hash(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<()> {
    let query = "UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to set password hash")?;
    Ok(())
}

/// Partial profile update; returns the fresh row, or `None` when the
/// account is gone.
pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    update: &ProfileUpdate,
) -> Result<Option<Account>> {
    let query = format!(
        "UPDATE accounts \
         SET first_name = COALESCE($2, first_name), \
             last_name = COALESCE($3, last_name), \
             phone = COALESCE($4, phone), \
             location = COALESCE($5, location), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {ACCOUNT_COLUMNS}"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone)
        .bind(&update.location)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update profile")?;

    row.as_ref().map(account_from_row).transpose()
}

/// Stage a new email and its verification secret. The primary email is
/// untouched until the staged address proves receipt.
pub async fn stage_email_change(
    pool: &PgPool,
    id: Uuid,
    pending_email: &str,
    secret: &GeneratedSecret,
) -> Result<()> {
    let query = "UPDATE accounts \
         SET pending_email = $2, email_change_token = $3, email_change_expires_at = $4, \
             updated_at = NOW() \
         WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .bind(pending_email)
        .bind(&secret.value)
        .bind(secret.expires_at)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to stage email change")?;
    Ok(())
}

/// Promote a staged email to primary if its token matches and is live.
/// The unique index catches an address registered by someone else since
/// staging.
pub async fn promote_pending_email(
    pool: &PgPool,
    pending_email: &str,
    token: &str,
) -> Result<EmailPromotion> {
    let query = "UPDATE accounts \
         SET email = pending_email, pending_email = NULL, email_change_token = NULL, \
             email_change_expires_at = NULL, updated_at = NOW() \
         WHERE pending_email = $1 AND email_change_token = $2 \
           AND email_change_expires_at > NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(pending_email)
        .bind(token)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(result) if result.rows_affected() > 0 => Ok(EmailPromotion::Promoted),
        Ok(_) => Ok(EmailPromotion::NoMatch),
        Err(err) if is_unique_violation(&err) => Ok(EmailPromotion::EmailTaken),
        Err(err) => Err(err).context("failed to promote pending email"),
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn account_from_row(row: &PgRow) -> Result<Account> {
    let role: String = row.get("role");
    let role = role
        .parse::<Role>()
        .map_err(|err| anyhow!("corrupt account row: {err}"))?;

    let last_login_at: Option<DateTime<Utc>> = row.get("last_login_at");

    Ok(Account {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        phone: row.get("phone"),
        location: row.get("location"),
        is_active: row.get("is_active"),
        is_email_verified: row.get("is_email_verified"),
        last_login_at,
        reset_otp: row.get("reset_otp"),
        reset_otp_expires_at: row.get("reset_otp_expires_at"),
        reset_token: row.get("reset_token"),
        reset_token_expires_at: row.get("reset_token_expires_at"),
        verification_token: row.get("verification_token"),
        verification_expires_at: row.get("verification_expires_at"),
        pending_email: row.get("pending_email"),
        email_change_token: row.get("email_change_token"),
        email_change_expires_at: row.get("email_change_expires_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[test]
    fn create_outcome_debug_names() {
        assert_eq!(format!("{:?}", CreateOutcome::DuplicateEmail), "DuplicateEmail");
    }

    #[test]
    fn email_promotion_variants() {
        assert_ne!(EmailPromotion::Promoted, EmailPromotion::NoMatch);
        assert_ne!(EmailPromotion::NoMatch, EmailPromotion::EmailTaken);
    }

    #[test]
    fn profile_update_default_is_noop() {
        let update = ProfileUpdate::default();
        assert!(update.first_name.is_none());
        assert!(update.last_name.is_none());
        assert!(update.phone.is_none());
        assert!(update.location.is_none());
    }

    #[test]
    fn schema_covers_every_selected_column() {
        for column in ACCOUNT_COLUMNS.split(',') {
            let column = column.trim();
            assert!(
                SCHEMA_SQL.contains(column),
                "column {column} missing from schema"
            );
        }
    }

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
