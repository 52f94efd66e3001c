//! Account domain core.
//!
//! Everything stateful about accounts lives here: the entity and its closed
//! role set, credential hashing, signed session tokens, one-time secrets,
//! the store gateway, and the lifecycle service that sequences them.
//! HTTP wiring stays in `crate::api`; mail delivery stays in `crate::mailer`.

pub mod account;
pub mod config;
pub mod error;
pub mod password;
pub mod secrets;
pub mod seed;
pub mod service;
pub mod store;
pub mod tokens;

pub use account::{Account, PublicAccount, Role};
pub use config::AuthConfig;
pub use error::AuthError;

use crate::mailer::Mailer;
use tokens::TokenIssuer;

/// Immutable per-process state handed to every lifecycle operation.
///
/// Built once at startup from the CLI config; nothing in here is read from
/// ambient globals afterwards.
pub struct AuthState {
    config: AuthConfig,
    tokens: TokenIssuer,
    mailer: Mailer,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, mailer: Mailer) -> Self {
        let tokens = TokenIssuer::new(&config);
        Self {
            config,
            tokens,
            mailer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }
}
