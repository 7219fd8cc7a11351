use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::common::{success, RangeParams};
use crate::auth::Role;
use crate::errors::ServiceError;
use crate::handlers::AppServices;

#[derive(Debug, Deserialize)]
struct SalesReportParams {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    user_id: Option<i32>,
    role: Option<String>,
}

async fn profit_report(
    State(state): State<Arc<AppServices>>,
    Query(params): Query<RangeParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let range = params.into_range()?;
    let report = state.reports.profit_report(range).await?;
    Ok(success("Profit report generated successfully", report))
}

async fn inventory_report(
    State(state): State<Arc<AppServices>>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state.reports.inventory_report().await?;
    Ok(success("Inventory report generated successfully", report))
}

async fn expiration_report(
    State(state): State<Arc<AppServices>>,
    Query(params): Query<RangeParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let range = params.into_range()?;
    let report = state.reports.expiration_report(range).await?;
    Ok(success("Expiration report generated successfully", report))
}

async fn sales_report(
    State(state): State<Arc<AppServices>>,
    Query(params): Query<SalesReportParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let range = RangeParams {
        start_date: params.start_date,
        end_date: params.end_date,
    }
    .into_range()?;
    let role = params.role.as_deref().map(str::parse::<Role>).transpose()?;
    let report = state
        .reports
        .sales_report(range, params.user_id, role)
        .await?;
    Ok(success("Sales report generated successfully", report))
}

pub fn routes() -> Router<Arc<AppServices>> {
    Router::new()
        .route("/profit", get(profit_report))
        .route("/inventory", get(inventory_report))
        .route("/expiration", get(expiration_report))
        .route("/sales", get(sales_report))
}
