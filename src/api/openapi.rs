//! `OpenAPI` document for the HTTP surface.

use utoipa::OpenApi;

use super::handlers::{
    account, admin, email_change, health, login, password_reset, register, types, verification,
};
use crate::auth::account::{PublicAccount, Role};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        register::register,
        login::login,
        login::logout,
        login::refresh,
        verification::verify_email,
        verification::resend_verification,
        password_reset::forgot_password,
        password_reset::verify_otp,
        password_reset::resend_otp,
        password_reset::reset_password,
        account::me,
        account::update_profile,
        account::change_password,
        email_change::update_email,
        email_change::resend_email_update,
        email_change::verify_new_email,
        admin::set_password,
    ),
    components(schemas(
        Role,
        PublicAccount,
        types::RegisterRequest,
        types::LoginRequest,
        types::RefreshRequest,
        types::ForgotPasswordRequest,
        types::VerifyOtpRequest,
        types::ResendOtpRequest,
        types::ResetPasswordRequest,
        types::UpdateProfileRequest,
        types::ChangePasswordRequest,
        types::UpdateEmailRequest,
        types::ResendEmailUpdateRequest,
        types::SetPasswordRequest,
        types::AuthData,
        types::TokenData,
        types::ResetTokenData,
    )),
    tags(
        (name = "auth", description = "Account lifecycle endpoints"),
        (name = "admin", description = "Privileged administration"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/health"));
        assert!(paths.contains_key("/api/v1/auth/register"));
        assert!(paths.contains_key("/api/v1/auth/login"));
        assert!(paths.contains_key("/api/v1/auth/verify-otp"));
        assert!(paths.contains_key("/api/v1/auth/set-password/{account_id}"));
        assert_eq!(paths.len(), 18);
    }
}
