//! Auth configuration.
//!
//! Built once from the CLI and passed by reference into every component;
//! secrets, mail credentials, and expiry windows never come from ambient
//! globals.

use secrecy::SecretString;

const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
const DEFAULT_HASH_TIME_COST: u32 = 3;
const DEFAULT_OTP_DIGITS: u32 = 6;
const DEFAULT_OTP_TTL_MINUTES: i64 = 10;
const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 10;
const DEFAULT_VERIFICATION_TTL_HOURS: i64 = 24;
const DEFAULT_EMAIL_CHANGE_TTL_HOURS: i64 = 24;
const DEFAULT_MAIL_QUEUE_CAPACITY: usize = 64;
const DEFAULT_CLIENT_URL: &str = "http://localhost:3000";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    access_token_secret: SecretString,
    refresh_token_secret: SecretString,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
    hash_time_cost: u32,
    otp_digits: u32,
    otp_ttl_minutes: i64,
    reset_token_ttl_minutes: i64,
    verification_ttl_hours: i64,
    email_change_ttl_hours: i64,
    mail_queue_capacity: usize,
    client_url: String,
    production: bool,
    manager_email: String,
    manager_password: SecretString,
    mail_api_url: Option<String>,
    mail_api_token: Option<SecretString>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(access_token_secret: SecretString, refresh_token_secret: SecretString) -> Self {
        Self {
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            hash_time_cost: DEFAULT_HASH_TIME_COST,
            otp_digits: DEFAULT_OTP_DIGITS,
            otp_ttl_minutes: DEFAULT_OTP_TTL_MINUTES,
            reset_token_ttl_minutes: DEFAULT_RESET_TOKEN_TTL_MINUTES,
            verification_ttl_hours: DEFAULT_VERIFICATION_TTL_HOURS,
            email_change_ttl_hours: DEFAULT_EMAIL_CHANGE_TTL_HOURS,
            mail_queue_capacity: DEFAULT_MAIL_QUEUE_CAPACITY,
            client_url: DEFAULT_CLIENT_URL.to_string(),
            production: false,
            manager_email: String::new(),
            manager_password: SecretString::default(),
            mail_api_url: None,
            mail_api_token: None,
        }
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_hash_time_cost(mut self, cost: u32) -> Self {
        self.hash_time_cost = cost;
        self
    }

    #[must_use]
    pub fn with_otp_digits(mut self, digits: u32) -> Self {
        self.otp_digits = digits;
        self
    }

    #[must_use]
    pub fn with_otp_ttl_minutes(mut self, minutes: i64) -> Self {
        self.otp_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_minutes(mut self, minutes: i64) -> Self {
        self.reset_token_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_verification_ttl_hours(mut self, hours: i64) -> Self {
        self.verification_ttl_hours = hours;
        self
    }

    #[must_use]
    pub fn with_email_change_ttl_hours(mut self, hours: i64) -> Self {
        self.email_change_ttl_hours = hours;
        self
    }

    #[must_use]
    pub fn with_mail_queue_capacity(mut self, capacity: usize) -> Self {
        self.mail_queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_client_url(mut self, client_url: String) -> Self {
        self.client_url = client_url;
        self
    }

    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    #[must_use]
    pub fn with_manager_email(mut self, email: String) -> Self {
        self.manager_email = email;
        self
    }

    #[must_use]
    pub fn with_manager_password(mut self, password: SecretString) -> Self {
        self.manager_password = password;
        self
    }

    #[must_use]
    pub fn with_mail_api_url(mut self, url: String) -> Self {
        self.mail_api_url = Some(url);
        self
    }

    #[must_use]
    pub fn with_mail_api_token(mut self, token: SecretString) -> Self {
        self.mail_api_token = Some(token);
        self
    }

    #[must_use]
    pub fn access_token_secret(&self) -> &SecretString {
        &self.access_token_secret
    }

    #[must_use]
    pub fn refresh_token_secret(&self) -> &SecretString {
        &self.refresh_token_secret
    }

    #[must_use]
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    #[must_use]
    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_seconds
    }

    #[must_use]
    pub fn hash_time_cost(&self) -> u32 {
        self.hash_time_cost
    }

    #[must_use]
    pub fn otp_digits(&self) -> u32 {
        self.otp_digits
    }

    #[must_use]
    pub fn otp_ttl_minutes(&self) -> i64 {
        self.otp_ttl_minutes
    }

    #[must_use]
    pub fn reset_token_ttl_minutes(&self) -> i64 {
        self.reset_token_ttl_minutes
    }

    #[must_use]
    pub fn verification_ttl_hours(&self) -> i64 {
        self.verification_ttl_hours
    }

    #[must_use]
    pub fn email_change_ttl_hours(&self) -> i64 {
        self.email_change_ttl_hours
    }

    #[must_use]
    pub fn mail_queue_capacity(&self) -> usize {
        self.mail_queue_capacity
    }

    #[must_use]
    pub fn client_url(&self) -> &str {
        &self.client_url
    }

    #[must_use]
    pub fn production(&self) -> bool {
        self.production
    }

    #[must_use]
    pub fn manager_email(&self) -> &str {
        &self.manager_email
    }

    #[must_use]
    pub fn manager_password(&self) -> &SecretString {
        &self.manager_password
    }

    #[must_use]
    pub fn mail_api_url(&self) -> Option<&str> {
        self.mail_api_url.as_deref()
    }

    #[must_use]
    pub fn mail_api_token(&self) -> Option<&SecretString> {
        self.mail_api_token.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("access".to_string()),
            SecretString::from("refresh".to_string()),
        )
    }

    #[test]
    fn defaults() {
        let config = config();

        assert_eq!(config.access_token_secret().expose_secret(), "access");
        assert_eq!(config.refresh_token_secret().expose_secret(), "refresh");
        assert_eq!(
            config.access_token_ttl_seconds(),
            DEFAULT_ACCESS_TOKEN_TTL_SECONDS
        );
        assert_eq!(
            config.refresh_token_ttl_seconds(),
            DEFAULT_REFRESH_TOKEN_TTL_SECONDS
        );
        assert_eq!(config.hash_time_cost(), DEFAULT_HASH_TIME_COST);
        assert_eq!(config.otp_digits(), DEFAULT_OTP_DIGITS);
        assert_eq!(config.otp_ttl_minutes(), DEFAULT_OTP_TTL_MINUTES);
        assert_eq!(
            config.reset_token_ttl_minutes(),
            DEFAULT_RESET_TOKEN_TTL_MINUTES
        );
        assert_eq!(
            config.verification_ttl_hours(),
            DEFAULT_VERIFICATION_TTL_HOURS
        );
        assert_eq!(config.client_url(), DEFAULT_CLIENT_URL);
        assert!(!config.production());
        assert!(config.mail_api_url().is_none());
    }

    #[test]
    fn overrides() {
        let config = config()
            .with_access_token_ttl_seconds(60)
            .with_refresh_token_ttl_seconds(120)
            .with_hash_time_cost(1)
            .with_otp_digits(8)
            .with_otp_ttl_minutes(5)
            .with_reset_token_ttl_minutes(2)
            .with_verification_ttl_hours(1)
            .with_email_change_ttl_hours(2)
            .with_mail_queue_capacity(8)
            .with_client_url("https://app.test".to_string())
            .with_production(true)
            .with_manager_email("root@app.test".to_string())
            .with_manager_password(SecretString::from("hunter2".to_string()))
            .with_mail_api_url("https://mail.test/send".to_string());

        assert_eq!(config.access_token_ttl_seconds(), 60);
        assert_eq!(config.refresh_token_ttl_seconds(), 120);
        assert_eq!(config.hash_time_cost(), 1);
        assert_eq!(config.otp_digits(), 8);
        assert_eq!(config.otp_ttl_minutes(), 5);
        assert_eq!(config.reset_token_ttl_minutes(), 2);
        assert_eq!(config.verification_ttl_hours(), 1);
        assert_eq!(config.email_change_ttl_hours(), 2);
        assert_eq!(config.mail_queue_capacity(), 8);
        assert_eq!(config.client_url(), "https://app.test");
        assert!(config.production());
        assert_eq!(config.manager_email(), "root@app.test");
        assert_eq!(config.manager_password().expose_secret(), "hunter2");
        assert_eq!(config.mail_api_url(), Some("https://mail.test/send"));
    }
}
