use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::db::DbPool;
use crate::entities::{medicine, sale, sale_item, user};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::medicines::{apply_stock_delta, decrement_stock_guarded};

const DEFAULT_STATUS: &str = "completed";

#[derive(Debug, Deserialize)]
pub struct SaleItemRequest {
    pub medicine_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub sale_date: NaiveDate,
    pub customer_name: String,
    pub status: Option<String>,
    pub items: Vec<SaleItemRequest>,
}

/// A sale header with its cashier name and line items.
#[derive(Debug, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub sold_by: String,
    pub items: Vec<sale_item::Model>,
}

/// List row: header plus the cashier name.
#[derive(Debug, Serialize)]
pub struct SaleSummary {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub sold_by: String,
}

/// Service for recording sales.
///
/// Lines are priced at the medicine's recommended price, and each stock
/// decrement is guarded so a sale can never take inventory below zero. Any
/// failing line aborts the whole sale.
#[derive(Clone)]
pub struct SaleService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl SaleService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(customer = %request.customer_name))]
    pub async fn create(
        &self,
        user_id: i32,
        request: CreateSaleRequest,
    ) -> Result<SaleWithItems, ServiceError> {
        validate_items(&request.items)?;
        if request.customer_name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Customer name is required".into(),
            ));
        }

        let txn = self.db.begin().await?;

        let now = Utc::now();
        let header = sale::ActiveModel {
            sale_date: Set(request.sale_date),
            customer_name: Set(request.customer_name),
            status: Set(request
                .status
                .unwrap_or_else(|| DEFAULT_STATUS.to_string())),
            total_amount: Set(Decimal::ZERO),
            user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let (items, total_amount) = apply_items(&txn, header.id, &request.items).await?;

        let mut active: sale::ActiveModel = header.into();
        active.total_amount = Set(total_amount);
        active.updated_at = Set(Utc::now());
        let header = active.update(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::SaleCreated(header.id)).await {
            warn!(error = %e, "failed to publish SaleCreated event");
        }

        let sold_by = self.cashier_name(header.user_id).await?;
        Ok(SaleWithItems {
            sale: header,
            sold_by,
            items,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<SaleWithItems, ServiceError> {
        let (header, cashier) = sale::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))?;

        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(id))
            .order_by_asc(sale_item::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(SaleWithItems {
            sale: header,
            sold_by: cashier.map(|u| u.username).unwrap_or_default(),
            items,
        })
    }

    /// Newest sales first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<SaleSummary>, u64), ServiceError> {
        let total = sale::Entity::find().count(self.db.as_ref()).await?;
        let rows = sale::Entity::find()
            .find_also_related(user::Entity)
            .order_by_desc(sale::Column::SaleDate)
            .order_by_desc(sale::Column::Id)
            .paginate(self.db.as_ref(), per_page.max(1))
            .fetch_page(page.saturating_sub(1))
            .await?;

        let summaries = rows
            .into_iter()
            .map(|(s, u)| SaleSummary {
                sale: s,
                sold_by: u.map(|u| u.username).unwrap_or_default(),
            })
            .collect();
        Ok((summaries, total))
    }

    /// Replaces a sale wholesale: old lines' stock is restored, old lines
    /// deleted, then the new item set is validated and applied as on create,
    /// repriced at the medicines' current recommended prices.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: i32,
        request: CreateSaleRequest,
    ) -> Result<SaleWithItems, ServiceError> {
        validate_items(&request.items)?;

        let txn = self.db.begin().await?;

        let header = sale::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))?;

        reverse_items(&txn, id).await?;

        let (items, total_amount) = apply_items(&txn, id, &request.items).await?;

        let mut active: sale::ActiveModel = header.into();
        active.sale_date = Set(request.sale_date);
        if !request.customer_name.is_empty() {
            active.customer_name = Set(request.customer_name);
        }
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        active.total_amount = Set(total_amount);
        active.updated_at = Set(Utc::now());
        let header = active.update(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::SaleUpdated(id)).await {
            warn!(error = %e, "failed to publish SaleUpdated event");
        }

        let sold_by = self.cashier_name(header.user_id).await?;
        Ok(SaleWithItems {
            sale: header,
            sold_by,
            items,
        })
    }

    /// Deletes a sale and puts its stock back on the shelf.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let header = sale::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))?;

        reverse_items(&txn, id).await?;
        sale::Entity::delete_by_id(header.id).exec(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::SaleDeleted(id)).await {
            warn!(error = %e, "failed to publish SaleDeleted event");
        }
        Ok(())
    }

    async fn cashier_name(&self, user_id: i32) -> Result<String, ServiceError> {
        Ok(user::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?
            .map(|u| u.username)
            .unwrap_or_default())
    }
}

fn validate_items(items: &[SaleItemRequest]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "A sale needs at least one item".into(),
        ));
    }
    for item in items {
        if item.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Item quantity must be at least 1".into(),
            ));
        }
    }
    Ok(())
}

/// Prices and inserts the line items, decrementing stock with a guard. A
/// guarded decrement that matches no row means the stock ran out between the
/// read and the write, and the sale is aborted.
async fn apply_items<C: ConnectionTrait>(
    conn: &C,
    sale_id: i32,
    items: &[SaleItemRequest],
) -> Result<(Vec<sale_item::Model>, Decimal), ServiceError> {
    let mut inserted = Vec::with_capacity(items.len());
    let mut total_amount = Decimal::ZERO;

    for item in items {
        let medicine = medicine::Entity::find_by_id(item.medicine_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Medicine {} not found", item.medicine_id))
            })?;

        if !decrement_stock_guarded(conn, medicine.id, item.quantity).await? {
            return Err(ServiceError::InsufficientStock(medicine.name));
        }

        let unit_price = medicine.recommended_price;
        let total_price = (unit_price * Decimal::from(item.quantity)).round_dp(2);
        total_amount += total_price;

        let now = Utc::now();
        let row = sale_item::ActiveModel {
            sale_id: Set(sale_id),
            medicine_id: Set(medicine.id),
            medicine_name: Set(medicine.name),
            quantity: Set(item.quantity),
            unit_price: Set(unit_price),
            total_price: Set(total_price),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        inserted.push(row);
    }

    Ok((inserted, total_amount))
}

/// Restores the stock sold by every line of a sale and deletes the lines.
async fn reverse_items<C: ConnectionTrait>(conn: &C, sale_id: i32) -> Result<(), ServiceError> {
    let old_items = sale_item::Entity::find()
        .filter(sale_item::Column::SaleId.eq(sale_id))
        .all(conn)
        .await?;

    for item in &old_items {
        apply_stock_delta(conn, item.medicine_id, item.quantity).await?;
    }

    sale_item::Entity::delete_many()
        .filter(sale_item::Column::SaleId.eq(sale_id))
        .exec(conn)
        .await?;
    Ok(())
}
