use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Extension, Router,
};

use super::common::{
    created_with_key, paginated, success, success_with_key, PaginationParams, DEFAULT_PAGE_SIZE,
};
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::handlers::AppServices;
use crate::services::sales::CreateSaleRequest;

async fn create_sale(
    State(state): State<Arc<AppServices>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.sales.create(auth_user.id, payload).await?;
    Ok(created_with_key("Sale recorded successfully", "sale", sale))
}

async fn list_sales(
    State(state): State<Arc<AppServices>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.page();
    let (sales, total) = state.sales.list(page, DEFAULT_PAGE_SIZE).await?;
    Ok(paginated("Sales retrieved successfully", &sales, total, page))
}

async fn get_sale(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.sales.get(id).await?;
    Ok(success_with_key("Sale retrieved successfully", "sale", sale))
}

async fn update_sale(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.sales.update(id, payload).await?;
    Ok(success_with_key("Sale updated successfully", "sale", sale))
}

async fn delete_sale(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.sales.delete(id).await?;
    Ok(success("Sale deleted successfully", ()))
}

pub fn routes() -> Router<Arc<AppServices>> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/:id", get(get_sale).put(update_sale).delete(delete_sale))
}
