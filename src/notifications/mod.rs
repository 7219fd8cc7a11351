use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::AppConfig;
use crate::errors::ServiceError;

/// Seam for delivering password-reset one-time codes.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), ServiceError>;
}

/// SMTP-backed mailer built from the app's SMTP settings.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn from_config(cfg: &AppConfig) -> Result<Option<Self>, ServiceError> {
        let Some(host) = cfg.smtp_host.as_deref() else {
            return Ok(None);
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| ServiceError::MailError(format!("SMTP transport: {}", e)))?
            .port(cfg.smtp_port);

        if let (Some(user), Some(pass)) = (&cfg.smtp_user, &cfg.smtp_pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Some(Self {
            transport: builder.build(),
            from: cfg.mail_from.clone(),
        }))
    }
}

#[async_trait]
impl OtpMailer for SmtpMailer {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), ServiceError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| ServiceError::MailError(format!("invalid from address: {}", e)))?,
            )
            .to(email
                .parse()
                .map_err(|e| ServiceError::MailError(format!("invalid to address: {}", e)))?)
            .subject("Password Reset OTP")
            .header(ContentType::TEXT_PLAIN)
            .body(format!("Your OTP for password reset is: {}", otp))
            .map_err(|e| ServiceError::MailError(format!("build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ServiceError::MailError(format!("send: {}", e)))?;
        Ok(())
    }
}

/// Logs instead of sending. Used in development and tests, and as the
/// fallback when no SMTP host is configured.
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_otp(&self, email: &str, _otp: &str) -> Result<(), ServiceError> {
        info!(email, "OTP mail suppressed (no SMTP host configured)");
        Ok(())
    }
}
