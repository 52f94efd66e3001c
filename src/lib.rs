//! # Accesso (Account Lifecycle & Authentication)
//!
//! `accesso` is the account authority for a multi-role marketplace. It
//! registers accounts, authenticates them, and walks them through the
//! verification workflows that gate access.
//!
//! ## Roles
//!
//! Every account carries exactly one role from a closed set (vendors,
//! buyers, drivers, and staff roles). The set is part of the API contract;
//! adding a role is a breaking change, not configuration.
//!
//! ## Credentials
//!
//! Passwords are stored as Argon2id digests. Sessions are a pair of HS256
//! tokens signed with independent secrets: a short-lived access token
//! carried as a bearer header, and a long-lived refresh token delivered in
//! an `HttpOnly` cookie and used only to mint new access tokens.
//!
//! ## One-time secrets
//!
//! Email verification, email change, and password reset all run on
//! single-use secrets with server-side expiry: opaque hex tokens for links
//! and a short numeric OTP for the reset flow. A secret is only honored
//! while its expiry is strictly in the future, and it is cleared in the
//! same statement that consumes it.

pub mod api;
pub mod auth;
pub mod cli;
pub mod mailer;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
