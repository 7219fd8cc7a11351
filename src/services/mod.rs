//! Business services. Each service owns the persistence logic for one part of
//! the domain and is handed the shared connection pool and event sender.

pub mod dashboard;
pub mod medicines;
pub mod password_reset;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod suppliers;
pub mod users;

use rust_decimal::Decimal;

/// Formats a monetary amount with exactly two decimal places.
pub fn money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}
