use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use super::common::{paginated, success, PaginationParams, RangeParams, DEFAULT_PAGE_SIZE};
use crate::errors::ServiceError;
use crate::handlers::AppServices;

async fn home(
    State(state): State<Arc<AppServices>>,
    Query(params): Query<RangeParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let range = params.into_range()?;
    let summary = state.dashboard.home(range).await?;
    Ok(success("Dashboard retrieved successfully", summary))
}

async fn recent_purchases(
    State(state): State<Arc<AppServices>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.page();
    let (purchases, total) = state.purchases.list(page, DEFAULT_PAGE_SIZE).await?;
    Ok(paginated(
        "Recent purchases retrieved successfully",
        &purchases,
        total,
        page,
    ))
}

async fn recent_sales(
    State(state): State<Arc<AppServices>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.page();
    let (sales, total) = state.sales.list(page, DEFAULT_PAGE_SIZE).await?;
    Ok(paginated(
        "Recent sales retrieved successfully",
        &sales,
        total,
        page,
    ))
}

pub fn routes() -> Router<Arc<AppServices>> {
    Router::new()
        .route("/", get(home))
        .route("/purchases", get(recent_purchases))
        .route("/sales", get(recent_sales))
}
