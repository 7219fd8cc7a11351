use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{instrument, warn};
use validator::Validate;

use crate::db::DbPool;
use crate::entities::medicine;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Markup applied to the latest purchase unit price to derive the shelf price.
pub const RECOMMENDED_MARKUP: Decimal = dec!(1.3);

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMedicineRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub manufacturer: Option<String>,
    pub expiry_date: NaiveDate,
}

/// Partial update. Absent fields keep their current values; the column set is
/// fixed, never assembled from request field names.
#[derive(Debug, Default, Deserialize)]
pub struct MedicinePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub manufacturer: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

impl MedicinePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.stock_quantity.is_none()
            && self.manufacturer.is_none()
            && self.expiry_date.is_none()
    }
}

/// Service for managing the medicine catalog and stock levels.
#[derive(Clone)]
pub struct MedicineService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl MedicineService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a medicine. The recommended price starts at the standard markup
    /// over the entered price and is refreshed by every later purchase.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        request: CreateMedicineRequest,
    ) -> Result<medicine::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if request.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must not be negative".into(),
            ));
        }
        if request.stock_quantity < 0 {
            return Err(ServiceError::ValidationError(
                "Stock quantity must not be negative".into(),
            ));
        }

        let now = Utc::now();
        let created = medicine::ActiveModel {
            name: Set(request.name),
            description: Set(request.description),
            category: Set(request.category),
            price: Set(request.price.round_dp(2)),
            recommended_price: Set(recommended_price(request.price)),
            stock_quantity: Set(request.stock_quantity),
            manufacturer: Set(request.manufacturer),
            expiry_date: Set(request.expiry_date),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        if let Err(e) = self
            .event_sender
            .send(Event::MedicineCreated(created.id))
            .await
        {
            warn!(error = %e, "failed to publish MedicineCreated event");
        }
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i32) -> Result<Option<medicine::Model>, ServiceError> {
        Ok(medicine::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?)
    }

    /// Fetches a medicine, treating absence as a not-found error.
    pub async fn get(&self, id: i32) -> Result<medicine::Model, ServiceError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Medicine {} not found", id)))
    }

    /// Lists medicines ordered by name, optionally filtered by a name
    /// substring, one page at a time. Returns the page and the total row count.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<(Vec<medicine::Model>, u64), ServiceError> {
        let mut query = medicine::Entity::find().order_by_asc(medicine::Column::Name);
        if let Some(term) = search.filter(|t| !t.is_empty()) {
            query = query.filter(medicine::Column::Name.contains(&term));
        }

        let paginator = query.paginate(self.db.as_ref(), per_page.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: i32,
        patch: MedicinePatch,
    ) -> Result<medicine::Model, ServiceError> {
        if patch.is_empty() {
            return Err(ServiceError::ValidationError(
                "No fields provided to update".into(),
            ));
        }

        let existing = self.get(id).await?;
        let mut active: medicine::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            if name.is_empty() {
                return Err(ServiceError::ValidationError("Name is required".into()));
            }
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(category) = patch.category {
            active.category = Set(Some(category));
        }
        if let Some(price) = patch.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price must not be negative".into(),
                ));
            }
            active.price = Set(price.round_dp(2));
            active.recommended_price = Set(recommended_price(price));
        }
        if let Some(stock_quantity) = patch.stock_quantity {
            if stock_quantity < 0 {
                return Err(ServiceError::ValidationError(
                    "Stock quantity must not be negative".into(),
                ));
            }
            active.stock_quantity = Set(stock_quantity);
        }
        if let Some(manufacturer) = patch.manufacturer {
            active.manufacturer = Set(Some(manufacturer));
        }
        if let Some(expiry_date) = patch.expiry_date {
            active.expiry_date = Set(expiry_date);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(self.db.as_ref()).await?;
        if let Err(e) = self
            .event_sender
            .send(Event::MedicineUpdated(updated.id))
            .await
        {
            warn!(error = %e, "failed to publish MedicineUpdated event");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        medicine::Entity::delete_by_id(existing.id)
            .exec(self.db.as_ref())
            .await?;
        if let Err(e) = self.event_sender.send(Event::MedicineDeleted(id)).await {
            warn!(error = %e, "failed to publish MedicineDeleted event");
        }
        Ok(())
    }
}

/// Recommended shelf price for a given purchase unit price.
pub fn recommended_price(unit_price: Decimal) -> Decimal {
    (unit_price * RECOMMENDED_MARKUP).round_dp(2)
}

/// Applies a signed stock delta in a single UPDATE statement, so concurrent
/// flows never lose each other's adjustments.
pub(crate) async fn apply_stock_delta<C: ConnectionTrait>(
    conn: &C,
    medicine_id: i32,
    delta: i32,
) -> Result<(), ServiceError> {
    medicine::Entity::update_many()
        .col_expr(
            medicine::Column::StockQuantity,
            Expr::col(medicine::Column::StockQuantity).add(delta),
        )
        .col_expr(medicine::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(medicine::Column::Id.eq(medicine_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Decrements stock only when enough is on hand. Returns `false` when the
/// guard filter matched no row, which after a successful read of the medicine
/// means the stock was insufficient.
pub(crate) async fn decrement_stock_guarded<C: ConnectionTrait>(
    conn: &C,
    medicine_id: i32,
    quantity: i32,
) -> Result<bool, ServiceError> {
    let result = medicine::Entity::update_many()
        .col_expr(
            medicine::Column::StockQuantity,
            Expr::col(medicine::Column::StockQuantity).sub(quantity),
        )
        .col_expr(medicine::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(medicine::Column::Id.eq(medicine_id))
        .filter(medicine::Column::StockQuantity.gte(quantity))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Repoints a medicine's pricing at the latest purchase unit price.
pub(crate) async fn apply_purchase_pricing<C: ConnectionTrait>(
    conn: &C,
    medicine_id: i32,
    unit_price: Decimal,
) -> Result<(), ServiceError> {
    medicine::Entity::update_many()
        .col_expr(medicine::Column::Price, Expr::value(unit_price.round_dp(2)))
        .col_expr(
            medicine::Column::RecommendedPrice,
            Expr::value(recommended_price(unit_price)),
        )
        .col_expr(medicine::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(medicine::Column::Id.eq(medicine_id))
        .exec(conn)
        .await?;
    Ok(())
}
