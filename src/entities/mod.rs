//! Database entities for the pharmacy back office.

pub mod medicine;
pub mod password_reset_token;
pub mod purchase;
pub mod purchase_item;
pub mod role;
pub mod sale;
pub mod sale_item;
pub mod supplier;
pub mod user;
