use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::instrument;

use crate::auth::Role;
use crate::db::DbPool;
use crate::entities::{medicine, purchase, purchase_item, role, sale, sale_item, user};
use crate::errors::ServiceError;
use crate::services::dashboard::{DateRange, EXPIRY_WINDOW_DAYS};
use crate::services::money;

/// Per-medicine profit over a window, plus the overall totals.
#[derive(Debug, Serialize)]
pub struct ProfitReport {
    pub total_revenue: String,
    pub total_expenses: String,
    pub total_profit: String,
    pub recommended_profit: String,
    pub rows: Vec<ProfitRow>,
}

#[derive(Debug, Serialize)]
pub struct ProfitRow {
    pub medicine_id: i32,
    pub medicine_name: String,
    pub units_sold: i64,
    pub revenue: String,
    pub cost: String,
    pub profit: String,
}

/// Per-medicine movement totals plus the current shelf state.
#[derive(Debug, Serialize)]
pub struct InventoryRow {
    pub medicine_id: i32,
    pub name: String,
    pub category: Option<String>,
    pub stock_quantity: i32,
    pub purchased_quantity: i64,
    pub sold_quantity: i64,
    pub price: String,
    pub recommended_price: String,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct ExpirationRow {
    pub medicine_id: i32,
    pub name: String,
    pub category: Option<String>,
    pub stock_quantity: i32,
    pub expiry_date: NaiveDate,
    pub status: ExpiryStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExpiryStatus {
    Expired,
    #[serde(rename = "Expiring Soon")]
    ExpiringSoon,
    Valid,
}

#[derive(Debug, Serialize)]
pub struct SalesReportRow {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub sold_by: String,
    pub role: String,
    pub items: Vec<sale_item::Model>,
}

/// Read-only report queries. Joins are resolved in Rust over window-bounded
/// row sets, which keeps the SQL portable across backends.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn profit_report(&self, range: DateRange) -> Result<ProfitReport, ServiceError> {
        let db = self.db.as_ref();

        let sales = sale::Entity::find()
            .filter(sale::Column::SaleDate.between(range.start, range.end))
            .all(db)
            .await?;
        let purchases = purchase::Entity::find()
            .filter(purchase::Column::PurchaseDate.between(range.start, range.end))
            .all(db)
            .await?;

        let sale_ids: Vec<i32> = sales.iter().map(|s| s.id).collect();
        let items = if sale_ids.is_empty() {
            Vec::new()
        } else {
            sale_item::Entity::find()
                .filter(sale_item::Column::SaleId.is_in(sale_ids))
                .all(db)
                .await?
        };

        let medicine_ids: Vec<i32> = items.iter().map(|i| i.medicine_id).collect();
        let medicines: HashMap<i32, medicine::Model> = if medicine_ids.is_empty() {
            HashMap::new()
        } else {
            medicine::Entity::find()
                .filter(medicine::Column::Id.is_in(medicine_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|m| (m.id, m))
                .collect()
        };

        let total_revenue: Decimal = sales.iter().map(|s| s.total_amount).sum();
        let total_expenses: Decimal = purchases.iter().map(|p| p.total_amount).sum();

        let mut by_medicine: HashMap<i32, (String, i64, Decimal, Decimal)> = HashMap::new();
        let mut total_profit = Decimal::ZERO;
        let mut recommended_profit = Decimal::ZERO;
        for item in &items {
            let Some(medicine) = medicines.get(&item.medicine_id) else {
                continue;
            };
            let quantity = Decimal::from(item.quantity);
            let cost = medicine.price * quantity;
            total_profit += item.total_price - cost;
            recommended_profit += medicine.recommended_price * quantity - cost;

            let entry = by_medicine
                .entry(item.medicine_id)
                .or_insert_with(|| (item.medicine_name.clone(), 0, Decimal::ZERO, Decimal::ZERO));
            entry.1 += item.quantity as i64;
            entry.2 += item.total_price;
            entry.3 += cost;
        }

        let mut rows: Vec<ProfitRow> = by_medicine
            .into_iter()
            .map(|(medicine_id, (medicine_name, units_sold, revenue, cost))| ProfitRow {
                medicine_id,
                medicine_name,
                units_sold,
                revenue: money(revenue),
                cost: money(cost),
                profit: money(revenue - cost),
            })
            .collect();
        rows.sort_by(|a, b| b.units_sold.cmp(&a.units_sold));

        Ok(ProfitReport {
            total_revenue: money(total_revenue),
            total_expenses: money(total_expenses),
            total_profit: money(total_profit),
            recommended_profit: money(recommended_profit),
            rows,
        })
    }

    /// Current stock next to all-time purchased and sold quantities.
    #[instrument(skip(self))]
    pub async fn inventory_report(&self) -> Result<Vec<InventoryRow>, ServiceError> {
        let db = self.db.as_ref();

        let medicines = medicine::Entity::find()
            .order_by_asc(medicine::Column::Name)
            .all(db)
            .await?;

        let mut purchased: HashMap<i32, i64> = HashMap::new();
        for item in purchase_item::Entity::find().all(db).await? {
            *purchased.entry(item.medicine_id).or_default() += item.quantity as i64;
        }

        let mut sold: HashMap<i32, i64> = HashMap::new();
        for item in sale_item::Entity::find().all(db).await? {
            *sold.entry(item.medicine_id).or_default() += item.quantity as i64;
        }

        Ok(medicines
            .into_iter()
            .map(|m| InventoryRow {
                medicine_id: m.id,
                name: m.name,
                category: m.category,
                stock_quantity: m.stock_quantity,
                purchased_quantity: purchased.get(&m.id).copied().unwrap_or(0),
                sold_quantity: sold.get(&m.id).copied().unwrap_or(0),
                price: money(m.price),
                recommended_price: money(m.recommended_price),
                expiry_date: m.expiry_date,
            })
            .collect())
    }

    /// Medicines whose expiry date falls inside the range, classified against
    /// today's date.
    #[instrument(skip(self))]
    pub async fn expiration_report(
        &self,
        range: DateRange,
    ) -> Result<Vec<ExpirationRow>, ServiceError> {
        let today = Utc::now().date_naive();
        let soon = today + Duration::days(EXPIRY_WINDOW_DAYS);

        let medicines = medicine::Entity::find()
            .filter(medicine::Column::ExpiryDate.between(range.start, range.end))
            .order_by_asc(medicine::Column::ExpiryDate)
            .all(self.db.as_ref())
            .await?;

        Ok(medicines
            .into_iter()
            .map(|m| {
                let status = if m.expiry_date < today {
                    ExpiryStatus::Expired
                } else if m.expiry_date <= soon {
                    ExpiryStatus::ExpiringSoon
                } else {
                    ExpiryStatus::Valid
                };
                ExpirationRow {
                    medicine_id: m.id,
                    name: m.name,
                    category: m.category,
                    stock_quantity: m.stock_quantity,
                    expiry_date: m.expiry_date,
                    status,
                }
            })
            .collect())
    }

    /// Sales joined with their cashier and role, optionally narrowed to one
    /// user or one role.
    #[instrument(skip(self))]
    pub async fn sales_report(
        &self,
        range: DateRange,
        user_id: Option<i32>,
        role_filter: Option<Role>,
    ) -> Result<Vec<SalesReportRow>, ServiceError> {
        let db = self.db.as_ref();

        let mut query = sale::Entity::find()
            .filter(sale::Column::SaleDate.between(range.start, range.end))
            .order_by_desc(sale::Column::SaleDate)
            .order_by_desc(sale::Column::Id);
        if let Some(user_id) = user_id {
            query = query.filter(sale::Column::UserId.eq(user_id));
        }
        let sales = query.all(db).await?;
        if sales.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<i32> = sales.iter().map(|s| s.user_id).collect();
        let users: HashMap<i32, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let roles: HashMap<i32, String> = role::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect();

        let sale_ids: Vec<i32> = sales.iter().map(|s| s.id).collect();
        let mut items_by_sale: HashMap<i32, Vec<sale_item::Model>> = HashMap::new();
        for item in sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.is_in(sale_ids))
            .all(db)
            .await?
        {
            items_by_sale.entry(item.sale_id).or_default().push(item);
        }

        let mut rows = Vec::with_capacity(sales.len());
        for sale in sales {
            let cashier = users.get(&sale.user_id);
            let role_name = cashier
                .and_then(|u| roles.get(&u.role_id))
                .cloned()
                .unwrap_or_default();
            if let Some(filter) = role_filter {
                if role_name != filter.as_str() {
                    continue;
                }
            }
            let sale_id = sale.id;
            rows.push(SalesReportRow {
                sale,
                sold_by: cashier.map(|u| u.username.clone()).unwrap_or_default(),
                role: role_name,
                items: items_by_sale.remove(&sale_id).unwrap_or_default(),
            });
        }
        Ok(rows)
    }
}
