use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use super::common::{
    created_with_key, paginated, success, success_with_key, PaginationParams, DEFAULT_PAGE_SIZE,
};
use crate::errors::ServiceError;
use crate::handlers::AppServices;
use crate::services::purchases::CreatePurchaseRequest;

async fn create_purchase(
    State(state): State<Arc<AppServices>>,
    Json(payload): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let purchase = state.purchases.create(payload).await?;
    Ok(created_with_key(
        "Purchase recorded successfully",
        "purchase",
        purchase,
    ))
}

async fn list_purchases(
    State(state): State<Arc<AppServices>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.page();
    let (purchases, total) = state.purchases.list(page, DEFAULT_PAGE_SIZE).await?;
    Ok(paginated(
        "Purchases retrieved successfully",
        &purchases,
        total,
        page,
    ))
}

async fn get_purchase(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let purchase = state.purchases.get(id).await?;
    Ok(success_with_key(
        "Purchase retrieved successfully",
        "purchase",
        purchase,
    ))
}

async fn update_purchase(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
    Json(payload): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let purchase = state.purchases.update(id, payload).await?;
    Ok(success_with_key(
        "Purchase updated successfully",
        "purchase",
        purchase,
    ))
}

async fn delete_purchase(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.purchases.delete(id).await?;
    Ok(success("Purchase deleted successfully", ()))
}

pub fn routes() -> Router<Arc<AppServices>> {
    Router::new()
        .route("/", get(list_purchases).post(create_purchase))
        .route(
            "/:id",
            get(get_purchase).put(update_purchase).delete(delete_purchase),
        )
}
