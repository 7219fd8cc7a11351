use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::auth::{AuthService, Role};
use crate::db::DbPool;
use crate::entities::{role, user};
use crate::errors::ServiceError;

/// User row joined with its role name, the shape the admin screens consume.
#[derive(Debug, Serialize)]
pub struct UserWithRole {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserWithRole {
    fn from_parts(user: user::Model, role: Option<role::Model>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: role.map(|r| r.name).unwrap_or_default(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Admin patch for a user. Absent fields are untouched; an entirely empty
/// patch is rejected.
#[derive(Debug, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_name: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role_name.is_none()
    }
}

/// Service for user administration and self-service profile changes.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
    auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(db: Arc<DbPool>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<UserWithRole>, u64), ServiceError> {
        let total = user::Entity::find().count(self.db.as_ref()).await?;
        let rows = user::Entity::find()
            .find_also_related(role::Entity)
            .order_by_asc(user::Column::Username)
            .paginate(self.db.as_ref(), per_page.max(1))
            .fetch_page(page.saturating_sub(1))
            .await?;

        let users = rows
            .into_iter()
            .map(|(u, r)| UserWithRole::from_parts(u, r))
            .collect();
        Ok((users, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<UserWithRole, ServiceError> {
        let (user, role) = user::Entity::find_by_id(id)
            .find_also_related(role::Entity)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))?;
        Ok(UserWithRole::from_parts(user, role))
    }

    async fn get_model(&self, id: i32) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))
    }

    async fn ensure_username_free(&self, username: &str, own_id: i32) -> Result<(), ServiceError> {
        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::Id.ne(own_id))
            .one(self.db.as_ref())
            .await?
            .is_some();
        if taken {
            return Err(ServiceError::Conflict("Username already exists".into()));
        }
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str, own_id: i32) -> Result<(), ServiceError> {
        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::Id.ne(own_id))
            .one(self.db.as_ref())
            .await?
            .is_some();
        if taken {
            return Err(ServiceError::Conflict("Email already exists".into()));
        }
        Ok(())
    }

    /// Admin update of any combination of username, email, password and role.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i32, patch: UserPatch) -> Result<UserWithRole, ServiceError> {
        if patch.is_empty() {
            return Err(ServiceError::ValidationError(
                "No fields provided to update".into(),
            ));
        }

        let existing = self.get_model(id).await?;
        let mut active: user::ActiveModel = existing.into();

        if let Some(username) = patch.username {
            if username.is_empty() {
                return Err(ServiceError::ValidationError("Username is required".into()));
            }
            self.ensure_username_free(&username, id).await?;
            active.username = Set(username);
        }
        if let Some(email) = patch.email {
            if email.is_empty() {
                return Err(ServiceError::ValidationError("Email is required".into()));
            }
            self.ensure_email_free(&email, id).await?;
            active.email = Set(email);
        }
        if let Some(password) = patch.password {
            active.password_hash = Set(self.auth.hash_password(&password)?);
        }
        if let Some(role_name) = patch.role_name {
            let role: Role = role_name.parse()?;
            let role_row = self.auth.find_or_create_role(role).await?;
            active.role_id = Set(role_row.id);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(self.db.as_ref()).await?;
        self.get(updated.id).await
    }

    /// Moves a user to a different role.
    #[instrument(skip(self))]
    pub async fn update_role(&self, id: i32, role: Role) -> Result<UserWithRole, ServiceError> {
        let existing = self.get_model(id).await?;
        let role_row = self.auth.find_or_create_role(role).await?;

        let mut active: user::ActiveModel = existing.into();
        active.role_id = Set(role_row.id);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db.as_ref()).await?;
        self.get(updated.id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let existing = self.get_model(id).await?;
        user::Entity::delete_by_id(existing.id)
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    /// Self-service username change.
    #[instrument(skip(self))]
    pub async fn update_own_username(
        &self,
        id: i32,
        username: String,
    ) -> Result<UserWithRole, ServiceError> {
        if username.is_empty() {
            return Err(ServiceError::ValidationError("Username is required".into()));
        }
        self.ensure_username_free(&username, id).await?;

        let existing = self.get_model(id).await?;
        let mut active: user::ActiveModel = existing.into();
        active.username = Set(username);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db.as_ref()).await?;
        self.get(updated.id).await
    }

    /// Self-service email change.
    #[instrument(skip(self))]
    pub async fn update_own_email(
        &self,
        id: i32,
        email: String,
    ) -> Result<UserWithRole, ServiceError> {
        if email.is_empty() {
            return Err(ServiceError::ValidationError("Email is required".into()));
        }
        self.ensure_email_free(&email, id).await?;

        let existing = self.get_model(id).await?;
        let mut active: user::ActiveModel = existing.into();
        active.email = Set(email);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db.as_ref()).await?;
        self.get(updated.id).await
    }

    /// Self-service password change. The current password must verify before
    /// the new hash is stored.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        if new_password.is_empty() {
            return Err(ServiceError::ValidationError(
                "New password is required".into(),
            ));
        }

        let existing = self.get_model(id).await?;
        if !self.auth.verify_password(current_password, &existing.password_hash) {
            return Err(ServiceError::AuthError(
                "Current password is incorrect".into(),
            ));
        }

        let mut active: user::ActiveModel = existing.into();
        active.password_hash = Set(self.auth.hash_password(new_password)?);
        active.updated_at = Set(Utc::now());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }
}
