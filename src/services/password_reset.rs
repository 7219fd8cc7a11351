use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::{instrument, warn};

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::entities::{password_reset_token, user};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::notifications::OtpMailer;

/// Password reset via emailed one-time codes.
///
/// A user holds at most one live code: requesting a new one deletes any
/// previous token row first. Codes are single use and expire after the
/// configured TTL.
#[derive(Clone)]
pub struct PasswordResetService {
    db: Arc<DbPool>,
    auth: Arc<AuthService>,
    mailer: Arc<dyn OtpMailer>,
    event_sender: Arc<EventSender>,
    otp_ttl: Duration,
}

impl PasswordResetService {
    pub fn new(
        db: Arc<DbPool>,
        auth: Arc<AuthService>,
        mailer: Arc<dyn OtpMailer>,
        event_sender: Arc<EventSender>,
        otp_ttl: Duration,
    ) -> Self {
        Self {
            db,
            auth,
            mailer,
            event_sender,
            otp_ttl,
        }
    }

    /// Issues a fresh 5-digit code for the account behind `email` and mails it.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), ServiceError> {
        let user = self.find_user_by_email(email).await?;

        // One live token per user.
        password_reset_token::Entity::delete_many()
            .filter(password_reset_token::Column::UserId.eq(user.id))
            .exec(self.db.as_ref())
            .await?;

        let otp = generate_otp();
        let now = Utc::now();
        password_reset_token::ActiveModel {
            user_id: Set(user.id),
            token: Set(otp.clone()),
            expires_at: Set(now + chrono::Duration::from_std(self.otp_ttl).unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        self.mailer.send_otp(&user.email, &otp).await?;

        if let Err(e) = self
            .event_sender
            .send(Event::PasswordResetRequested(user.id))
            .await
        {
            warn!(error = %e, "failed to publish PasswordResetRequested event");
        }
        Ok(())
    }

    /// Consumes a code and replaces the account password. Expired codes are
    /// deleted on sight so they cannot be retried.
    #[instrument(skip(self, otp, new_password))]
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        if new_password.is_empty() {
            return Err(ServiceError::ValidationError(
                "New password is required".into(),
            ));
        }

        let user = self.find_user_by_email(email).await?;

        let token = password_reset_token::Entity::find()
            .filter(password_reset_token::Column::UserId.eq(user.id))
            .filter(password_reset_token::Column::Token.eq(otp))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::ValidationError("Invalid OTP".into()))?;

        if token.expires_at < Utc::now() {
            password_reset_token::Entity::delete_by_id(token.id)
                .exec(self.db.as_ref())
                .await?;
            return Err(ServiceError::ValidationError("Expired OTP".into()));
        }

        let mut active: user::ActiveModel = user.clone().into();
        active.password_hash = Set(self.auth.hash_password(new_password)?);
        active.updated_at = Set(Utc::now());
        active.update(self.db.as_ref()).await?;

        password_reset_token::Entity::delete_by_id(token.id)
            .exec(self.db.as_ref())
            .await?;

        if let Err(e) = self
            .event_sender
            .send(Event::PasswordResetCompleted(user.id))
            .await
        {
            warn!(error = %e, "failed to publish PasswordResetCompleted event");
        }
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<user::Model, ServiceError> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("User with this email not found".into()))
    }
}

/// Five-digit numeric code, zero padding excluded by the range.
fn generate_otp() -> String {
    rand::thread_rng().gen_range(10_000..100_000).to_string()
}
