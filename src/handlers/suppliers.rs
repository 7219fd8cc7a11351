use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use super::common::{created, paginated, success, PaginationParams, DEFAULT_PAGE_SIZE};
use crate::errors::ServiceError;
use crate::handlers::AppServices;
use crate::services::suppliers::{CreateSupplierRequest, SupplierPatch};

async fn create_supplier(
    State(state): State<Arc<AppServices>>,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state.suppliers.create(payload).await?;
    Ok(created("Supplier created successfully", supplier))
}

async fn list_suppliers(
    State(state): State<Arc<AppServices>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.page();
    let (suppliers, total) = state
        .suppliers
        .list(page, DEFAULT_PAGE_SIZE, params.search)
        .await?;
    Ok(paginated(
        "Suppliers retrieved successfully",
        &suppliers,
        total,
        page,
    ))
}

async fn get_supplier(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state.suppliers.get(id).await?;
    Ok(success("Supplier retrieved successfully", supplier))
}

async fn update_supplier(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
    Json(patch): Json<SupplierPatch>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state.suppliers.update(id, patch).await?;
    Ok(success("Supplier updated successfully", supplier))
}

async fn delete_supplier(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.suppliers.delete(id).await?;
    Ok(success("Supplier deleted successfully", ()))
}

pub fn routes() -> Router<Arc<AppServices>> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}
