//! Startup seeding for the manager account.

use anyhow::Result;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::{debug, info};

use super::account::Role;
use super::config::AuthConfig;
use super::store::{self, CreateOutcome, NewAccount};
use super::password;

/// Create the manager account if no account holds the MANAGER role yet.
///
/// Runs once at startup, outside the request-driven lifecycle. The seeded
/// account is active and pre-verified so it can log in immediately.
pub async fn seed_manager(pool: &PgPool, config: &AuthConfig) -> Result<()> {
    if store::manager_exists(pool).await? {
        debug!("manager account already present, skipping seed");
        return Ok(());
    }

    let password_hash = password::hash(
        config.manager_password().expose_secret().to_string(),
        config.hash_time_cost(),
    )
    .await?;

    let outcome = store::create(
        pool,
        &NewAccount {
            first_name: "Super".to_string(),
            last_name: "Admin".to_string(),
            email: config.manager_email().to_string(),
            password_hash,
            role: Role::Manager,
            phone: Some("0000000000".to_string()),
            location: Some("Headquarters".to_string()),
            is_email_verified: true,
            verification: None,
        },
    )
    .await?;

    match outcome {
        CreateOutcome::Created(account) => {
            info!("Manager account seeded: {}", account.email);
        }
        CreateOutcome::DuplicateEmail => {
            // Another instance won the race; nothing to do.
            debug!("manager email already registered");
        }
    }

    Ok(())
}
