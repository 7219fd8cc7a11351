use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};

use super::common::{created_with_key, success};
use crate::auth::{LoginRequest, RegisterRequest};
use crate::errors::ServiceError;
use crate::handlers::AppServices;

async fn register(
    State(state): State<Arc<AppServices>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.auth.register(payload).await?;
    Ok(created_with_key("User registered successfully", "user", user))
}

async fn login(
    State(state): State<Arc<AppServices>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let token = state.auth.login(payload).await?;
    Ok(success("Login successful", token))
}

pub fn routes() -> Router<Arc<AppServices>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
