//! Authentication and authorization.
//!
//! Login issues a signed, time-limited JWT binding the user id and role name;
//! middleware validates the bearer token and attaches an [`AuthUser`] to the
//! request. Route-level authorization checks the caller's role against a
//! closed allow-list of [`Role`] variants.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::db::DbPool;
use crate::entities::{role, user};
use crate::errors::ServiceError;

const TOKEN_ISSUER: &str = "pharmacy-api";

/// The closed set of roles the system knows about. Authorization never deals
/// in raw role ids; role rows are matched by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Pharmacist,
    InventoryManager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pharmacist => "pharmacist",
            Role::InventoryManager => "inventory_manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "pharmacist" => Ok(Role::Pharmacist),
            "inventory_manager" => Ok(Role::InventoryManager),
            other => Err(ServiceError::ValidationError(format!(
                "Unknown role: {other}"
            ))),
        }
    }
}

/// Claims carried by access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Username, kept so handlers can echo the cashier without a lookup
    pub username: String,
    /// Role name
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Authenticated caller attached to the request by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_ttl: Duration) -> Self {
        Self {
            jwt_secret,
            token_ttl,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Issues and validates tokens, hashes and verifies passwords, and owns user
/// registration.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DbPool>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>) -> Self {
        Self { config, db }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::InternalError(format!("password hashing failed: {e}")))
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        PasswordHash::new(password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Looks a role up by name, creating it with a default description when it
    /// does not exist yet. The name must belong to the closed [`Role`] set.
    pub async fn find_or_create_role(&self, role: Role) -> Result<role::Model, ServiceError> {
        if let Some(existing) = role::Entity::find()
            .filter(role::Column::Name.eq(role.as_str()))
            .one(self.db.as_ref())
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let created = role::ActiveModel {
            name: Set(role.as_str().to_string()),
            description: Set(Some(format!("Default role for {}", role.as_str()))),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        Ok(created)
    }

    /// Registers a new user: duplicate username/email are rejected before the
    /// insert and the password is hashed before storage.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<user::Model, ServiceError> {
        let role: Role = request.role_name.parse()?;

        let existing_username = user::Entity::find()
            .filter(user::Column::Username.eq(request.username.clone()))
            .one(self.db.as_ref())
            .await?;
        if existing_username.is_some() {
            return Err(ServiceError::Conflict("Username already exists".into()));
        }

        let existing_email = user::Entity::find()
            .filter(user::Column::Email.eq(request.email.clone()))
            .one(self.db.as_ref())
            .await?;
        if existing_email.is_some() {
            return Err(ServiceError::Conflict("Email already exists".into()));
        }

        let role_row = self.find_or_create_role(role).await?;
        let password_hash = self.hash_password(&request.password)?;

        let now = Utc::now();
        let created = user::ActiveModel {
            username: Set(request.username),
            email: Set(request.email),
            password_hash: Set(password_hash),
            role_id: Set(role_row.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        Ok(created)
    }

    /// Verifies credentials and issues an access token. The password check is
    /// a slow salted hash comparison, never plaintext equality.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, ServiceError> {
        let Some(user) = user::Entity::find()
            .filter(user::Column::Email.eq(request.email.clone()))
            .one(self.db.as_ref())
            .await?
        else {
            return Err(ServiceError::AuthError("Invalid credentials".into()));
        };

        if !self.verify_password(&request.password, &user.password_hash) {
            return Err(ServiceError::AuthError("Invalid credentials".into()));
        }

        let role_row = role::Entity::find_by_id(user.role_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::InternalError("user has no role row".into()))?;
        let role: Role = role_row.name.parse()?;

        let token = self.issue_token(&user, role)?;
        Ok(TokenResponse { token })
    }

    pub fn issue_token(&self, user: &user::Model, role: Role) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + self.config.token_ttl.as_secs() as i64,
            iss: TOKEN_ISSUER.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("token encoding failed: {e}")))
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[TOKEN_ISSUER]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!(error = %e, "token validation failed");
            ServiceError::AuthError("Invalid or expired token".into())
        })?;

        let id: i32 = data
            .claims
            .sub
            .parse()
            .map_err(|_| ServiceError::AuthError("Invalid token subject".into()))?;
        let role: Role = data
            .claims
            .role
            .parse()
            .map_err(|_: ServiceError| ServiceError::AuthError("Invalid token role".into()))?;

        Ok(AuthUser {
            id,
            username: data.claims.username,
            role,
        })
    }
}

/// Authentication middleware: validates the bearer token and attaches the
/// caller to the request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return ServiceError::InternalError("Authentication service not available".into())
                .into_response()
        }
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return ServiceError::AuthError("Missing bearer token".into()).into_response();
    };

    match auth_service.validate_token(token) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Allow-list of roles for a set of routes.
#[derive(Clone, Debug)]
pub struct AllowedRoles(pub &'static [Role]);

/// Role middleware: rejects callers whose role is not in the allow-list.
pub async fn role_middleware(
    State(allowed): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ServiceError::AuthError("Missing bearer token".into()))?;

    if !allowed.0.contains(&user.role) {
        return Err(ServiceError::Forbidden);
    }

    Ok(next.run(request).await)
}

/// Extension methods for Router to attach auth and role checks.
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_roles(self, roles: &'static [Role]) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_roles(self, roles: &'static [Role]) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            AllowedRoles(roles),
            role_middleware,
        ))
        .with_auth()
    }
}
