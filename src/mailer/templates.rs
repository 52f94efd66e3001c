//! HTML bodies for outbound email.

/// Verification email sent at registration and on resend.
#[must_use]
pub fn verification(name: &str, verification_url: &str) -> (String, String) {
    let html = format!(
        r##"<div style="font-family: Arial, sans-serif; max-width: 500px; margin: 0 auto; padding: 20px; border: 1px solid #eee; border-radius: 5px;">
    <h2 style="color: #333;">Hello {name},</h2>
    <p style="color: #666;">Please verify your email address by clicking the button below:</p>
    <div style="text-align: center; margin: 30px 0;">
        <a href="{verification_url}" style="background: #667eea; color: white; padding: 12px 30px; text-decoration: none; border-radius: 5px; display: inline-block;">Verify Email</a>
    </div>
    <p style="color: #999; font-size: 12px;">Or copy this link: {verification_url}</p>
    <p style="color: #999; font-size: 12px;">This link expires in 24 hours.</p>
</div>"##
    );
    ("Verify Your Email".to_string(), html)
}

/// OTP email for the password-reset flow.
#[must_use]
pub fn otp(name: Option<&str>, code: &str) -> (String, String) {
    let greeting = name.map_or_else(|| "Hello,".to_string(), |name| format!("Hello {name},"));
    let html = format!(
        r##"<div style="font-family: Arial, sans-serif; max-width: 400px; margin: 0 auto; padding: 20px; border: 1px solid #eee; border-radius: 5px;">
    <h2 style="color: #333;">{greeting}</h2>
    <p style="color: #666;">Your OTP code is:</p>
    <div style="background: #f5f5f5; padding: 15px; text-align: center; font-size: 32px; font-weight: bold; letter-spacing: 5px; border-radius: 5px;">
        {code}
    </div>
    <p style="color: #999; font-size: 12px; margin-top: 20px;">This code expires in 10 minutes.</p>
</div>"##
    );
    ("Your OTP Code".to_string(), html)
}

/// Welcome email sent right after registration.
#[must_use]
pub fn welcome(name: &str) -> (String, String) {
    let html = format!(
        r##"<div style="font-family: Arial, sans-serif; max-width: 500px; margin: 0 auto; padding: 20px; border: 1px solid #eee; border-radius: 5px;">
    <h2 style="color: #333;">Welcome {name}!</h2>
    <p style="color: #666;">Thank you for registering. Please verify your email to get started.</p>
</div>"##
    );
    ("Welcome to Our Platform".to_string(), html)
}

/// Verification email sent to a staged (new) address.
#[must_use]
pub fn email_change(name: &str, verification_url: &str) -> (String, String) {
    let html = format!(
        r##"<div style="font-family: Arial, sans-serif; max-width: 500px; margin: 0 auto; padding: 20px; border: 1px solid #eee; border-radius: 5px;">
    <h2 style="color: #333;">Hello {name},</h2>
    <p style="color: #666;">Please verify your new email address by clicking the button below:</p>
    <div style="text-align: center; margin: 30px 0;">
        <a href="{verification_url}" style="background: #667eea; color: white; padding: 12px 30px; text-decoration: none; border-radius: 5px; display: inline-block;">Verify New Email</a>
    </div>
    <p style="color: #999; font-size: 12px;">This link expires in 24 hours.</p>
</div>"##
    );
    ("Verify Your New Email".to_string(), html)
}
