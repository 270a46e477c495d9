/// Email service for verification, login OTP and password reset mail.
///
/// Delivery itself is delegated infrastructure; this wrapper is the seam
/// that keeps it out of the handlers. With no SMTP host configured it runs
/// in no-op mode and only logs, which is what local development uses.
use std::sync::Arc;

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::{EmailConfig, FrontendConfig};
use crate::error::{AppError, Result};

/// Async email transport wrapper (SMTP or no-op)
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
    frontend_base_url: String,
}

impl EmailService {
    /// Build the email service from configuration.
    ///
    /// If the SMTP host is empty, operates in no-op mode (logs only).
    pub fn new(config: &EmailConfig, frontend: &FrontendConfig) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| {
                AppError::Internal(format!("Failed to configure SMTP transport: {}", e))
            })?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            from,
            frontend_base_url: frontend.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check if the SMTP transport is enabled
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send a verification email with an activation link.
    pub async fn send_verification_email(
        &self,
        recipient: &str,
        name: &str,
        token: &str,
    ) -> Result<()> {
        let link = format!(
            "{}/verify-email?email={}&token={}",
            self.frontend_base_url, recipient, token
        );
        let subject = "Verify your Twiller account";
        let body = format!(
            "Hi {},\n\nPlease click the following link to verify your email address:\n{}\n\n\
             The link expires in 24 hours. If you did not sign up, ignore this email.",
            name, link
        );
        self.send_mail(recipient, subject, &body).await
    }

    /// Send a 6-digit login OTP.
    pub async fn send_otp_email(&self, recipient: &str, otp: &str) -> Result<()> {
        let subject = "Your Twiller login code";
        let body = format!(
            "Your Twiller login code is: {}\n\nThe code expires in 10 minutes.\n\n\
             If you did not try to log in, ignore this email.",
            otp
        );
        self.send_mail(recipient, subject, &body).await
    }

    /// Send a password reset link.
    pub async fn send_password_reset_email(&self, recipient: &str, token: &str) -> Result<()> {
        let link = format!(
            "{}/reset-password?token={}",
            self.frontend_base_url, token
        );
        let subject = "Twiller password reset";
        let body = format!(
            "We received your password reset request.\n\nReset your password here:\n{}\n\n\
             The link expires in 1 hour. If you did not request this, ignore this email.",
            link
        );
        self.send_mail(recipient, subject, &body).await
    }

    async fn send_mail(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let Some(transport) = &self.transport else {
            warn!(
                recipient = %mask_email(recipient),
                subject,
                "SMTP disabled; skipping email delivery"
            );
            return Ok(());
        };

        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| AppError::Validation(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        info!(recipient = %mask_email(recipient), subject, "Email sent");
        Ok(())
    }
}

/// Mask an email address for logging.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at) if at > 2 => format!("{}***{}", &email[..1], &email[at..]),
        Some(at) => format!("**{}", &email[at..]),
        None => "***@***".to_string(),
    }
}
