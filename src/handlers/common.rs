use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::ServiceError;
use crate::services::dashboard::DateRange;

/// Fixed page size for every list endpoint.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub search: Option<String>,
}

impl PaginationParams {
    /// 1-based page number; anything absent or zero is page one.
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Optional date window, defaulting to the last seven days inclusive.
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RangeParams {
    pub fn into_range(self) -> Result<DateRange, ServiceError> {
        let end = self.end_date.unwrap_or_else(|| Utc::now().date_naive());
        let start = self.start_date.unwrap_or(end - Duration::days(6));
        DateRange::new(start, end)
    }
}

fn envelope(status: StatusCode, message: &str, data: Value) -> Response {
    let body = json!({
        "status": status.as_u16(),
        "error": false,
        "message": message,
        "data": data,
    });
    (status, Json(body)).into_response()
}

pub fn success<T: Serialize>(message: &str, data: T) -> Response {
    envelope(StatusCode::OK, message, json!(data))
}

pub fn created<T: Serialize>(message: &str, data: T) -> Response {
    envelope(StatusCode::CREATED, message, json!(data))
}

/// Envelope with the payload under a named top-level key instead of `data`,
/// the shape some of the documented endpoints use.
pub fn success_with_key<T: Serialize>(message: &str, key: &str, value: T) -> Response {
    let body = json!({
        "status": StatusCode::OK.as_u16(),
        "error": false,
        "message": message,
        key: json!(value),
    });
    (StatusCode::OK, Json(body)).into_response()
}

pub fn created_with_key<T: Serialize>(message: &str, key: &str, value: T) -> Response {
    let body = json!({
        "status": StatusCode::CREATED.as_u16(),
        "error": false,
        "message": message,
        key: json!(value),
    });
    (StatusCode::CREATED, Json(body)).into_response()
}

/// List envelope: `{meta: {total}, page: {current, total, size}, data}`.
pub fn paginated<T: Serialize>(message: &str, rows: &[T], total: u64, current_page: u64) -> Response {
    let page_total = total.div_ceil(DEFAULT_PAGE_SIZE);
    let data = json!({
        "meta": { "total": total },
        "page": {
            "current": current_page,
            "total": page_total,
            "size": DEFAULT_PAGE_SIZE,
        },
        "data": json!(rows),
    });
    envelope(StatusCode::OK, message, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_one() {
        let params = PaginationParams {
            page: None,
            search: None,
        };
        assert_eq!(params.page(), 1);
        let zero = PaginationParams {
            page: Some(0),
            search: None,
        };
        assert_eq!(zero.page(), 1);
    }

    #[test]
    fn range_defaults_to_last_seven_days() {
        let range = RangeParams {
            start_date: None,
            end_date: None,
        }
        .into_range()
        .unwrap();
        assert_eq!((range.end - range.start).num_days(), 6);
    }
}
