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
use crate::entities::{medicine, purchase, purchase_item, supplier};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::medicines::{apply_purchase_pricing, apply_stock_delta};

const DEFAULT_STATUS: &str = "completed";

#[derive(Debug, Deserialize)]
pub struct PurchaseItemRequest {
    pub medicine_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub supplier_id: i32,
    pub purchase_date: NaiveDate,
    pub status: Option<String>,
    pub items: Vec<PurchaseItemRequest>,
}

/// A purchase header with its supplier name and line items.
#[derive(Debug, Serialize)]
pub struct PurchaseWithItems {
    #[serde(flatten)]
    pub purchase: purchase::Model,
    pub supplier_name: String,
    pub items: Vec<purchase_item::Model>,
}

/// List row: header plus the supplier name.
#[derive(Debug, Serialize)]
pub struct PurchaseSummary {
    #[serde(flatten)]
    pub purchase: purchase::Model,
    pub supplier_name: String,
}

/// Service for recording stock purchases.
///
/// Every mutation runs in one transaction: line items, stock increments and
/// medicine repricing either all land or none do.
#[derive(Clone)]
pub struct PurchaseService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PurchaseService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(supplier_id = request.supplier_id))]
    pub async fn create(
        &self,
        request: CreatePurchaseRequest,
    ) -> Result<PurchaseWithItems, ServiceError> {
        validate_items(&request.items)?;

        let txn = self.db.begin().await?;

        let supplier = supplier::Entity::find_by_id(request.supplier_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", request.supplier_id))
            })?;

        let now = Utc::now();
        let header = purchase::ActiveModel {
            supplier_id: Set(supplier.id),
            purchase_date: Set(request.purchase_date),
            status: Set(request
                .status
                .unwrap_or_else(|| DEFAULT_STATUS.to_string())),
            total_amount: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let (items, total_amount) = apply_items(&txn, header.id, &request.items).await?;

        let mut active: purchase::ActiveModel = header.into();
        active.total_amount = Set(total_amount);
        active.updated_at = Set(Utc::now());
        let header = active.update(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self
            .event_sender
            .send(Event::PurchaseCreated(header.id))
            .await
        {
            warn!(error = %e, "failed to publish PurchaseCreated event");
        }

        Ok(PurchaseWithItems {
            purchase: header,
            supplier_name: supplier.name,
            items,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<PurchaseWithItems, ServiceError> {
        let (header, supplier) = purchase::Entity::find_by_id(id)
            .find_also_related(supplier::Entity)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase {} not found", id)))?;

        let items = purchase_item::Entity::find()
            .filter(purchase_item::Column::PurchaseId.eq(id))
            .order_by_asc(purchase_item::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(PurchaseWithItems {
            purchase: header,
            supplier_name: supplier.map(|s| s.name).unwrap_or_default(),
            items,
        })
    }

    /// Newest purchases first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<PurchaseSummary>, u64), ServiceError> {
        let total = purchase::Entity::find().count(self.db.as_ref()).await?;
        let rows = purchase::Entity::find()
            .find_also_related(supplier::Entity)
            .order_by_desc(purchase::Column::PurchaseDate)
            .order_by_desc(purchase::Column::Id)
            .paginate(self.db.as_ref(), per_page.max(1))
            .fetch_page(page.saturating_sub(1))
            .await?;

        let summaries = rows
            .into_iter()
            .map(|(p, s)| PurchaseSummary {
                purchase: p,
                supplier_name: s.map(|s| s.name).unwrap_or_default(),
            })
            .collect();
        Ok((summaries, total))
    }

    /// Replaces a purchase wholesale: the old lines' stock increases are
    /// reversed, the old lines deleted, and the new item set applied exactly
    /// as on create.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: i32,
        request: CreatePurchaseRequest,
    ) -> Result<PurchaseWithItems, ServiceError> {
        validate_items(&request.items)?;

        let txn = self.db.begin().await?;

        let header = purchase::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase {} not found", id)))?;

        let supplier = supplier::Entity::find_by_id(request.supplier_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", request.supplier_id))
            })?;

        reverse_items(&txn, id).await?;

        let (items, total_amount) = apply_items(&txn, id, &request.items).await?;

        let mut active: purchase::ActiveModel = header.into();
        active.supplier_id = Set(supplier.id);
        active.purchase_date = Set(request.purchase_date);
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        active.total_amount = Set(total_amount);
        active.updated_at = Set(Utc::now());
        let header = active.update(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::PurchaseUpdated(id)).await {
            warn!(error = %e, "failed to publish PurchaseUpdated event");
        }

        Ok(PurchaseWithItems {
            purchase: header,
            supplier_name: supplier.name,
            items,
        })
    }

    /// Deletes a purchase, taking its stock back out of inventory.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let header = purchase::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase {} not found", id)))?;

        reverse_items(&txn, id).await?;
        purchase::Entity::delete_by_id(header.id).exec(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::PurchaseDeleted(id)).await {
            warn!(error = %e, "failed to publish PurchaseDeleted event");
        }
        Ok(())
    }
}

fn validate_items(items: &[PurchaseItemRequest]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "A purchase needs at least one item".into(),
        ));
    }
    for item in items {
        if item.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Item quantity must be at least 1".into(),
            ));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Unit price must not be negative".into(),
            ));
        }
    }
    Ok(())
}

/// Inserts the line items, bumps stock and repoints medicine pricing. Returns
/// the inserted rows and the purchase total (sum of rounded line totals).
async fn apply_items<C: ConnectionTrait>(
    conn: &C,
    purchase_id: i32,
    items: &[PurchaseItemRequest],
) -> Result<(Vec<purchase_item::Model>, Decimal), ServiceError> {
    let mut inserted = Vec::with_capacity(items.len());
    let mut total_amount = Decimal::ZERO;

    for item in items {
        let medicine = medicine::Entity::find_by_id(item.medicine_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Medicine {} not found", item.medicine_id))
            })?;

        let total_price = (item.unit_price * Decimal::from(item.quantity)).round_dp(2);
        total_amount += total_price;

        let now = Utc::now();
        let row = purchase_item::ActiveModel {
            purchase_id: Set(purchase_id),
            medicine_id: Set(medicine.id),
            medicine_name: Set(medicine.name.clone()),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price.round_dp(2)),
            total_price: Set(total_price),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        inserted.push(row);

        apply_stock_delta(conn, medicine.id, item.quantity).await?;
        apply_purchase_pricing(conn, medicine.id, item.unit_price).await?;
    }

    Ok((inserted, total_amount))
}

/// Reverses the stock added by every line of a purchase and deletes the lines.
/// The decrement is deliberately unguarded: stock already sold on can push the
/// count negative, which the inventory report surfaces.
async fn reverse_items<C: ConnectionTrait>(conn: &C, purchase_id: i32) -> Result<(), ServiceError> {
    let old_items = purchase_item::Entity::find()
        .filter(purchase_item::Column::PurchaseId.eq(purchase_id))
        .all(conn)
        .await?;

    for item in &old_items {
        apply_stock_delta(conn, item.medicine_id, -item.quantity).await?;
    }

    purchase_item::Entity::delete_many()
        .filter(purchase_item::Column::PurchaseId.eq(purchase_id))
        .exec(conn)
        .await?;
    Ok(())
}
