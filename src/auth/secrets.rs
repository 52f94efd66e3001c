//! One-time secret generation.
//!
//! Opaque tokens go into email links; numeric codes are short enough to
//! type from a phone screen. Both come from the OS CSPRNG and carry their
//! expiry with them so callers can never store one without the other.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, Rng, RngCore};

const OPAQUE_TOKEN_BYTES: usize = 32;

/// A generated secret paired with its expiry.
#[derive(Clone, Debug)]
pub struct GeneratedSecret {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// High-entropy hex token with the default 24 hour lifetime.
pub fn opaque_token() -> Result<GeneratedSecret> {
    opaque_token_with_ttl(Duration::hours(24))
}

/// High-entropy hex token with a caller-chosen lifetime.
pub fn opaque_token_with_ttl(ttl: Duration) -> Result<GeneratedSecret> {
    let mut bytes = [0u8; OPAQUE_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate opaque token")?;
    Ok(GeneratedSecret {
        value: hex::encode(bytes),
        expires_at: Utc::now() + ttl,
    })
}

/// Zero-padded numeric one-time code.
#[must_use]
pub fn numeric_code(digits: u32, ttl: Duration) -> GeneratedSecret {
    let upper = 10u64.pow(digits);
    let code = OsRng.gen_range(0..upper);
    GeneratedSecret {
        value: format!("{code:0width$}", width = digits as usize),
        expires_at: Utc::now() + ttl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_token_is_hex_of_expected_length() {
        let secret = opaque_token().expect("token");
        assert_eq!(secret.value.len(), OPAQUE_TOKEN_BYTES * 2);
        assert!(secret.value.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn opaque_tokens_are_unique() {
        let first = opaque_token().expect("token");
        let second = opaque_token().expect("token");
        assert_ne!(first.value, second.value);
    }

    #[test]
    fn opaque_token_default_expiry_is_24h_out() {
        let before = Utc::now() + Duration::hours(24) - Duration::minutes(1);
        let secret = opaque_token().expect("token");
        let after = Utc::now() + Duration::hours(24) + Duration::minutes(1);
        assert!(secret.expires_at > before);
        assert!(secret.expires_at < after);
    }

    #[test]
    fn opaque_token_honors_custom_ttl() {
        let secret = opaque_token_with_ttl(Duration::minutes(10)).expect("token");
        assert!(secret.expires_at < Utc::now() + Duration::minutes(11));
        assert!(secret.expires_at > Utc::now() + Duration::minutes(9));
    }

    #[test]
    fn numeric_code_is_zero_padded_to_width() {
        for _ in 0..32 {
            let secret = numeric_code(6, Duration::minutes(10));
            assert_eq!(secret.value.len(), 6);
            assert!(secret.value.chars().all(|c| c.is_ascii_digit()));
            assert!(secret.value.parse::<u64>().expect("numeric") < 1_000_000);
        }
    }

    #[test]
    fn numeric_code_supports_other_widths() {
        let secret = numeric_code(4, Duration::minutes(5));
        assert_eq!(secret.value.len(), 4);
        assert!(secret.expires_at > Utc::now());
    }
}
