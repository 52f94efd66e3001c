//! Account entity and the closed role set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Fixed role set. Adding a role is an API contract change, not
/// configuration.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Vendor,
    Buyer,
    Driver,
    InventoryManager,
    Pricer,
    Treasurer,
    Manager,
    Client,
    SalesAgent,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Vendor,
        Role::Buyer,
        Role::Driver,
        Role::InventoryManager,
        Role::Pricer,
        Role::Treasurer,
        Role::Manager,
        Role::Client,
        Role::SalesAgent,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Vendor => "VENDOR",
            Role::Buyer => "BUYER",
            Role::Driver => "DRIVER",
            Role::InventoryManager => "INVENTORY_MANAGER",
            Role::Pricer => "PRICER",
            Role::Treasurer => "TREASURER",
            Role::Manager => "MANAGER",
            Role::Client => "CLIENT",
            Role::SalesAgent => "SALES_AGENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRoleError(pub String);

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| UnknownRoleError(value.to_string()))
    }
}

/// Persisted account record.
///
/// Each ephemeral secret travels with its expiry; the pair is always set and
/// cleared together, never one without the other.
#[derive(Clone, Debug)]
pub struct Account {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub reset_otp: Option<String>,
    pub reset_otp_expires_at: Option<DateTime<Utc>>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub verification_token: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
    pub pending_email: Option<String>,
    pub email_change_token: Option<String>,
    pub email_change_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outward representation of an account.
///
/// The password digest and every one-time secret stay server-side.
#[derive(ToSchema, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub is_active: bool,
    pub is_email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for PublicAccount {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            role: account.role,
            phone: account.phone.clone(),
            location: account.location.clone(),
            is_active: account.is_active,
            is_email_verified: account.is_email_verified,
            last_login: account.last_login_at,
            pending_email: account.pending_email.clone(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    pub(crate) fn sample_account() -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::Buyer,
            phone: None,
            location: None,
            is_active: true,
            is_email_verified: false,
            last_login_at: None,
            reset_otp: None,
            reset_otp_expires_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            verification_token: Some("token".to_string()),
            verification_expires_at: Some(now),
            pending_email: None,
            email_change_token: None,
            email_change_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().ok(), Some(role));
        }
    }

    #[test]
    fn role_rejects_unknown_tags() {
        assert!("SUPERUSER".parse::<Role>().is_err());
        assert!("vendor".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_screaming_snake() -> Result<()> {
        let value = serde_json::to_value(Role::InventoryManager)?;
        assert_eq!(value, serde_json::json!("INVENTORY_MANAGER"));
        let decoded: Role = serde_json::from_value(serde_json::json!("SALES_AGENT"))?;
        assert_eq!(decoded, Role::SalesAgent);
        Ok(())
    }

    #[test]
    fn public_account_never_carries_secrets() -> Result<()> {
        let mut account = sample_account();
        account.reset_otp = Some("123456".to_string());
        account.reset_token = Some("deadbeef".to_string());

        let value = serde_json::to_value(PublicAccount::from(&account))?;
        let object = value.as_object().expect("object");

        assert_eq!(
            object.get("email").and_then(serde_json::Value::as_str),
            Some("ada@example.com")
        );
        assert!(object.get("password").is_none());
        assert!(object.get("passwordHash").is_none());
        assert!(object.get("resetOtp").is_none());
        assert!(object.get("resetToken").is_none());
        assert!(object.get("verificationToken").is_none());
        assert!(object.get("emailChangeToken").is_none());
        Ok(())
    }

    #[test]
    fn public_account_uses_camel_case_keys() -> Result<()> {
        let account = sample_account();
        let value = serde_json::to_value(PublicAccount::from(&account))?;
        let object = value.as_object().expect("object");
        assert!(object.contains_key("firstName"));
        assert!(object.contains_key("isEmailVerified"));
        assert!(object.contains_key("createdAt"));
        Ok(())
    }
}
