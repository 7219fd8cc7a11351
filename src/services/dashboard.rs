use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::{medicine, purchase, sale, sale_item, supplier, user};
use crate::errors::ServiceError;
use crate::services::money;

/// Stock level at or below which a medicine counts as low on stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;
/// Medicines expiring within this many days count as expiring soon.
pub const EXPIRY_WINDOW_DAYS: i64 = 30;

/// Inclusive date range a dashboard request covers.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ServiceError> {
        if end < start {
            return Err(ServiceError::ValidationError(
                "End date must not precede start date".into(),
            ));
        }
        Ok(Self { start, end })
    }

    /// The window of equal length immediately before this one.
    fn previous(&self) -> DateRange {
        let days = (self.end - self.start).num_days() + 1;
        DateRange {
            start: self.start - Duration::days(days),
            end: self.start - Duration::days(1),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InventorySnapshot {
    pub total_medicines: u64,
    pub total_stock: i64,
    pub total_suppliers: u64,
    pub low_stock_count: u64,
    pub expiring_soon_count: u64,
}

/// A monetary figure for the requested window next to the preceding window,
/// with the period-over-period change.
#[derive(Debug, Serialize)]
pub struct ChangeMetric {
    pub current: String,
    pub previous: String,
    pub change_percent: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CountMetric {
    pub current: u64,
    pub previous: u64,
    pub change_percent: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PeriodComparison {
    pub sales_count: CountMetric,
    pub revenue: ChangeMetric,
    pub expenses: ChangeMetric,
    pub profit: ChangeMetric,
    pub recommended_profit: ChangeMetric,
    pub average_sale: ChangeMetric,
}

#[derive(Debug, Serialize)]
pub struct PharmacistRank {
    pub user_id: i32,
    pub username: String,
    pub sales_count: u64,
    pub total: String,
}

#[derive(Debug, Serialize)]
pub struct SupplierRank {
    pub supplier_id: i32,
    pub name: String,
    pub purchase_count: u64,
    pub total: String,
}

#[derive(Debug, Serialize)]
pub struct DailyChartRow {
    pub date: NaiveDate,
    pub revenue: String,
    pub expenses: String,
    pub profit: String,
}

#[derive(Debug, Serialize)]
pub struct BestSeller {
    pub medicine_id: i32,
    pub medicine_name: String,
    pub quantity_sold: i64,
    pub revenue: String,
}

#[derive(Debug, Serialize)]
pub struct HomeSummary {
    pub inventory: InventorySnapshot,
    pub period: PeriodComparison,
    pub pharmacist_ranking: Vec<PharmacistRank>,
    pub supplier_ranking: Vec<SupplierRank>,
    pub chart: Vec<DailyChartRow>,
    pub best_sellers: Vec<BestSeller>,
}

#[derive(Debug, Default)]
struct WindowTotals {
    sales_count: u64,
    revenue: Decimal,
    expenses: Decimal,
    profit: Decimal,
    recommended_profit: Decimal,
    average_sale: Decimal,
}

#[derive(FromQueryResult)]
struct StockSum {
    total: Option<i64>,
}

/// Read-only aggregations behind the home screen.
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn home(&self, range: DateRange) -> Result<HomeSummary, ServiceError> {
        let inventory = self.inventory_snapshot().await?;

        let current = self.window_totals(range).await?;
        let previous = self.window_totals(range.previous()).await?;
        let period = compare_windows(&current, &previous);

        let sales = self.sales_in(range).await?;
        let purchases = self.purchases_in(range).await?;
        let items = self.sale_items_for(&sales).await?;
        let medicines = self.medicines_for(&items).await?;

        let pharmacist_ranking = self.rank_pharmacists(&sales).await?;
        let supplier_ranking = self.rank_suppliers(&purchases).await?;
        let chart = build_chart(range, &sales, &purchases, &items, &medicines);
        let best_sellers = best_sellers(&items);

        Ok(HomeSummary {
            inventory,
            period,
            pharmacist_ranking,
            supplier_ranking,
            chart,
            best_sellers,
        })
    }

    async fn inventory_snapshot(&self) -> Result<InventorySnapshot, ServiceError> {
        let db = self.db.as_ref();
        let today = Utc::now().date_naive();
        let horizon = today + Duration::days(EXPIRY_WINDOW_DAYS);

        let total_medicines = medicine::Entity::find().count(db).await?;
        let total_suppliers = supplier::Entity::find().count(db).await?;
        let low_stock_count = medicine::Entity::find()
            .filter(medicine::Column::StockQuantity.lte(LOW_STOCK_THRESHOLD))
            .count(db)
            .await?;
        let expiring_soon_count = medicine::Entity::find()
            .filter(medicine::Column::ExpiryDate.lte(horizon))
            .count(db)
            .await?;

        let total_stock = medicine::Entity::find()
            .select_only()
            .column_as(Expr::col(medicine::Column::StockQuantity).sum(), "total")
            .into_model::<StockSum>()
            .one(db)
            .await?
            .and_then(|row| row.total)
            .unwrap_or(0);

        Ok(InventorySnapshot {
            total_medicines,
            total_stock,
            total_suppliers,
            low_stock_count,
            expiring_soon_count,
        })
    }

    async fn sales_in(&self, range: DateRange) -> Result<Vec<sale::Model>, ServiceError> {
        Ok(sale::Entity::find()
            .filter(sale::Column::SaleDate.between(range.start, range.end))
            .order_by_asc(sale::Column::SaleDate)
            .all(self.db.as_ref())
            .await?)
    }

    async fn purchases_in(&self, range: DateRange) -> Result<Vec<purchase::Model>, ServiceError> {
        Ok(purchase::Entity::find()
            .filter(purchase::Column::PurchaseDate.between(range.start, range.end))
            .order_by_asc(purchase::Column::PurchaseDate)
            .all(self.db.as_ref())
            .await?)
    }

    async fn sale_items_for(
        &self,
        sales: &[sale::Model],
    ) -> Result<Vec<sale_item::Model>, ServiceError> {
        if sales.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = sales.iter().map(|s| s.id).collect();
        Ok(sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.is_in(ids))
            .all(self.db.as_ref())
            .await?)
    }

    async fn medicines_for(
        &self,
        items: &[sale_item::Model],
    ) -> Result<HashMap<i32, medicine::Model>, ServiceError> {
        if items.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<i32> = items.iter().map(|i| i.medicine_id).collect();
        let rows = medicine::Entity::find()
            .filter(medicine::Column::Id.is_in(ids))
            .all(self.db.as_ref())
            .await?;
        Ok(rows.into_iter().map(|m| (m.id, m)).collect())
    }

    /// Revenue, expenses and profit figures for one window. Profit is the
    /// charged line total minus the cost price of the units sold; recommended
    /// profit prices the same units at the current recommended price instead.
    async fn window_totals(&self, range: DateRange) -> Result<WindowTotals, ServiceError> {
        let sales = self.sales_in(range).await?;
        let purchases = self.purchases_in(range).await?;
        let items = self.sale_items_for(&sales).await?;
        let medicines = self.medicines_for(&items).await?;

        let sales_count = sales.len() as u64;
        let revenue: Decimal = sales.iter().map(|s| s.total_amount).sum();
        let expenses: Decimal = purchases.iter().map(|p| p.total_amount).sum();

        let mut profit = Decimal::ZERO;
        let mut recommended_profit = Decimal::ZERO;
        for item in &items {
            let Some(medicine) = medicines.get(&item.medicine_id) else {
                continue;
            };
            let quantity = Decimal::from(item.quantity);
            let cost = medicine.price * quantity;
            profit += item.total_price - cost;
            recommended_profit += medicine.recommended_price * quantity - cost;
        }

        let average_sale = if sales_count > 0 {
            (revenue / Decimal::from(sales_count)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Ok(WindowTotals {
            sales_count,
            revenue,
            expenses,
            profit: profit.round_dp(2),
            recommended_profit: recommended_profit.round_dp(2),
            average_sale,
        })
    }

    async fn rank_pharmacists(
        &self,
        sales: &[sale::Model],
    ) -> Result<Vec<PharmacistRank>, ServiceError> {
        let mut by_user: HashMap<i32, (u64, Decimal)> = HashMap::new();
        for sale in sales {
            let entry = by_user.entry(sale.user_id).or_default();
            entry.0 += 1;
            entry.1 += sale.total_amount;
        }
        if by_user.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = by_user.keys().copied().collect();
        let users: HashMap<i32, String> = user::Entity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let mut totals: Vec<(i32, u64, Decimal)> = by_user
            .into_iter()
            .map(|(user_id, (sales_count, total))| (user_id, sales_count, total))
            .collect();
        totals.sort_by(|a, b| b.2.cmp(&a.2));

        Ok(totals
            .into_iter()
            .map(|(user_id, sales_count, total)| PharmacistRank {
                user_id,
                username: users.get(&user_id).cloned().unwrap_or_default(),
                sales_count,
                total: money(total),
            })
            .collect())
    }

    async fn rank_suppliers(
        &self,
        purchases: &[purchase::Model],
    ) -> Result<Vec<SupplierRank>, ServiceError> {
        let mut by_supplier: HashMap<i32, (u64, Decimal)> = HashMap::new();
        for purchase in purchases {
            let entry = by_supplier.entry(purchase.supplier_id).or_default();
            entry.0 += 1;
            entry.1 += purchase.total_amount;
        }
        if by_supplier.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = by_supplier.keys().copied().collect();
        let suppliers: HashMap<i32, String> = supplier::Entity::find()
            .filter(supplier::Column::Id.is_in(ids))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let mut totals: Vec<(i32, u64, Decimal)> = by_supplier
            .into_iter()
            .map(|(supplier_id, (purchase_count, total))| (supplier_id, purchase_count, total))
            .collect();
        totals.sort_by(|a, b| b.2.cmp(&a.2));

        Ok(totals
            .into_iter()
            .map(|(supplier_id, purchase_count, total)| SupplierRank {
                supplier_id,
                name: suppliers.get(&supplier_id).cloned().unwrap_or_default(),
                purchase_count,
                total: money(total),
            })
            .collect())
    }
}

fn compare_windows(current: &WindowTotals, previous: &WindowTotals) -> PeriodComparison {
    PeriodComparison {
        sales_count: CountMetric {
            current: current.sales_count,
            previous: previous.sales_count,
            change_percent: percentage_change(
                Decimal::from(previous.sales_count),
                Decimal::from(current.sales_count),
            ),
        },
        revenue: change_metric(previous.revenue, current.revenue),
        expenses: change_metric(previous.expenses, current.expenses),
        profit: change_metric(previous.profit, current.profit),
        recommended_profit: change_metric(previous.recommended_profit, current.recommended_profit),
        average_sale: change_metric(previous.average_sale, current.average_sale),
    }
}

fn change_metric(previous: Decimal, current: Decimal) -> ChangeMetric {
    ChangeMetric {
        current: money(current),
        previous: money(previous),
        change_percent: percentage_change(previous, current),
    }
}

/// Period-over-period change in percent. A window growing out of nothing is
/// pinned at 100; two empty windows are flat at 0.
pub fn percentage_change(previous: Decimal, current: Decimal) -> Decimal {
    if previous.is_zero() {
        if current > Decimal::ZERO {
            Decimal::from(100)
        } else {
            Decimal::ZERO
        }
    } else {
        ((current - previous) / previous * Decimal::from(100)).round_dp(2)
    }
}

fn build_chart(
    range: DateRange,
    sales: &[sale::Model],
    purchases: &[purchase::Model],
    items: &[sale_item::Model],
    medicines: &HashMap<i32, medicine::Model>,
) -> Vec<DailyChartRow> {
    let mut revenue_by_day: HashMap<NaiveDate, Decimal> = HashMap::new();
    let mut expenses_by_day: HashMap<NaiveDate, Decimal> = HashMap::new();
    let mut profit_by_day: HashMap<NaiveDate, Decimal> = HashMap::new();

    for sale in sales {
        *revenue_by_day.entry(sale.sale_date).or_default() += sale.total_amount;
    }
    for purchase in purchases {
        *expenses_by_day.entry(purchase.purchase_date).or_default() += purchase.total_amount;
    }

    let sale_dates: HashMap<i32, NaiveDate> = sales.iter().map(|s| (s.id, s.sale_date)).collect();
    for item in items {
        let (Some(date), Some(medicine)) =
            (sale_dates.get(&item.sale_id), medicines.get(&item.medicine_id))
        else {
            continue;
        };
        let cost = medicine.price * Decimal::from(item.quantity);
        *profit_by_day.entry(*date).or_default() += item.total_price - cost;
    }

    let mut rows = Vec::new();
    let mut date = range.start;
    while date <= range.end {
        rows.push(DailyChartRow {
            date,
            revenue: money(revenue_by_day.get(&date).copied().unwrap_or_default()),
            expenses: money(expenses_by_day.get(&date).copied().unwrap_or_default()),
            profit: money(profit_by_day.get(&date).copied().unwrap_or_default()),
        });
        date += Duration::days(1);
    }
    rows
}

fn best_sellers(items: &[sale_item::Model]) -> Vec<BestSeller> {
    let mut by_medicine: HashMap<i32, (String, i64, Decimal)> = HashMap::new();
    for item in items {
        let entry = by_medicine
            .entry(item.medicine_id)
            .or_insert_with(|| (item.medicine_name.clone(), 0, Decimal::ZERO));
        entry.1 += item.quantity as i64;
        entry.2 += item.total_price;
    }

    let mut sellers: Vec<BestSeller> = by_medicine
        .into_iter()
        .map(|(medicine_id, (medicine_name, quantity_sold, revenue))| BestSeller {
            medicine_id,
            medicine_name,
            quantity_sold,
            revenue: money(revenue),
        })
        .collect();
    sellers.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));
    sellers.truncate(5);
    sellers
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn percentage_change_handles_zero_previous() {
        assert_eq!(percentage_change(dec!(0), dec!(50)), dec!(100));
        assert_eq!(percentage_change(dec!(0), dec!(0)), dec!(0));
    }

    #[test]
    fn percentage_change_computes_drop() {
        assert_eq!(percentage_change(dec!(200), dec!(100)), dec!(-50.00));
    }

    #[test]
    fn previous_window_has_equal_length() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
        )
        .unwrap();
        let prev = range.previous();
        assert_eq!(prev.start, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(prev.end, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let result = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        );
        assert!(result.is_err());
    }
}
