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
use crate::services::medicines::{CreateMedicineRequest, MedicinePatch};

async fn create_medicine(
    State(state): State<Arc<AppServices>>,
    Json(payload): Json<CreateMedicineRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let medicine = state.medicines.create(payload).await?;
    Ok(created("Medicine created successfully", medicine))
}

async fn list_medicines(
    State(state): State<Arc<AppServices>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.page();
    let (medicines, total) = state
        .medicines
        .list(page, DEFAULT_PAGE_SIZE, params.search)
        .await?;
    Ok(paginated(
        "Medicines retrieved successfully",
        &medicines,
        total,
        page,
    ))
}

async fn get_medicine(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let medicine = state.medicines.get(id).await?;
    Ok(success("Medicine retrieved successfully", medicine))
}

async fn update_medicine(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
    Json(patch): Json<MedicinePatch>,
) -> Result<impl IntoResponse, ServiceError> {
    let medicine = state.medicines.update(id, patch).await?;
    Ok(success("Medicine updated successfully", medicine))
}

async fn delete_medicine(
    State(state): State<Arc<AppServices>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.medicines.delete(id).await?;
    Ok(success("Medicine deleted successfully", ()))
}

pub fn routes() -> Router<Arc<AppServices>> {
    Router::new()
        .route("/", get(list_medicines).post(create_medicine))
        .route(
            "/:id",
            get(get_medicine).put(update_medicine).delete(delete_medicine),
        )
}
