use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;

use super::common::{
    created_with_key, paginated, success, success_with_key, PaginationParams, DEFAULT_PAGE_SIZE,
};
use crate::auth::{AuthRouterExt, AuthUser, RegisterRequest, Role};
use crate::errors::ServiceError;
use crate::handlers::{AppServices, ADMIN_ONLY};
use crate::services::users::UserPatch;

#[derive(Debug, Deserialize)]
struct ForgotPasswordRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
struct ResetPasswordRequest {
    email: String,
    otp: String,
    new_password: String,
}

#[derive(Debug, Deserialize)]
struct RoleChangeRequest {
    role_name: String,
}

#[derive(Debug, Deserialize)]
struct UsernameChangeRequest {
    username: String,
}

#[derive(Debug, Deserialize)]
struct EmailChangeRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
struct PasswordChangeRequest {
    current_password: String,
    new_password: String,
}

async fn forgot_password(
    State(state): State<Arc<AppServices>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state.password_reset.forgot_password(&payload.email).await?;
    Ok(success("OTP sent to your email", ()))
}

async fn reset_password(
    State(state): State<Arc<AppServices>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .password_reset
        .reset_password(&payload.email, &payload.otp, &payload.new_password)
        .await?;
    Ok(success("Password reset successfully", ()))
}

async fn list_users(
    State(state): State<Arc<AppServices>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.page();
    let (users, total) = state.users.list(page, DEFAULT_PAGE_SIZE).await?;
    Ok(paginated("Users retrieved successfully", &users, total, page))
}

async fn get_user(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.users.get(id).await?;
    Ok(success_with_key("User retrieved successfully", "user", user))
}

async fn create_user(
    State(state): State<Arc<AppServices>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.auth.register(payload).await?;
    Ok(created_with_key("User created successfully", "user", user))
}

async fn update_user(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
    Json(patch): Json<UserPatch>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.users.update(id, patch).await?;
    Ok(success_with_key("User updated successfully", "user", user))
}

async fn update_user_role(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
    Json(payload): Json<RoleChangeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let role: Role = payload.role_name.parse()?;
    let user = state.users.update_role(id, role).await?;
    Ok(success_with_key("User role updated successfully", "user", user))
}

async fn delete_user(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.users.delete(id).await?;
    Ok(success("User deleted successfully", ()))
}

async fn get_profile(
    State(state): State<Arc<AppServices>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.users.get(auth_user.id).await?;
    Ok(success_with_key("Profile retrieved successfully", "user", user))
}

async fn update_own_username(
    State(state): State<Arc<AppServices>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UsernameChangeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state
        .users
        .update_own_username(auth_user.id, payload.username)
        .await?;
    Ok(success_with_key("Username updated successfully", "user", user))
}

async fn update_own_email(
    State(state): State<Arc<AppServices>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<EmailChangeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state
        .users
        .update_own_email(auth_user.id, payload.email)
        .await?;
    Ok(success_with_key("Email updated successfully", "user", user))
}

async fn change_password(
    State(state): State<Arc<AppServices>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<PasswordChangeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .users
        .change_password(auth_user.id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(success("Password changed successfully", ()))
}

pub fn routes() -> Router<Arc<AppServices>> {
    let public = Router::new()
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password));

    let profile = Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/username", put(update_own_username))
        .route("/profile/email", put(update_own_email))
        .route("/profile/password", put(change_password))
        .with_auth();

    let admin = Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/role", put(update_user_role))
        .with_roles(ADMIN_ONLY);

    public.merge(profile).merge(admin)
}
