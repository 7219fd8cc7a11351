//! Pharmacy back-office API.
//!
//! Inventory, suppliers, purchases, sales and reporting over a relational
//! database, served as a JSON HTTP API with JWT authentication and role-based
//! authorization.

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod notifications;
pub mod services;

pub use config::AppConfig;
pub use db::DbPool;
pub use errors::ServiceError;
pub use handlers::{api_router, AppServices};
