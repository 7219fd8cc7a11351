#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use pharmacy_api::{
    auth::{LoginRequest, RegisterRequest},
    config::AppConfig,
    db::{self, DbPool},
    entities::{medicine, supplier},
    events::{self, EventSender},
    handlers::{api_router, AppServices},
    notifications::LogMailer,
    services::medicines::CreateMedicineRequest,
    services::suppliers::CreateSupplierRequest,
};

/// Test harness: router plus services over a fresh in-memory SQLite database.
pub struct TestApp {
    pub router: Router,
    pub services: AppServices,
    pub db: Arc<DbPool>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        // A single pooled connection keeps the in-memory database alive.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::build(db.clone(), &cfg, event_sender, Arc::new(LogMailer));
        let router = api_router(services.clone());

        Self {
            router,
            services,
            db,
            _event_task: event_task,
        }
    }

    /// Registers a user and returns their id.
    pub async fn register_user(&self, username: &str, email: &str, role_name: &str) -> i32 {
        self.services
            .auth
            .register(RegisterRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: "correct horse battery".to_string(),
                role_name: role_name.to_string(),
            })
            .await
            .expect("failed to register test user")
            .id
    }

    /// Logs a registered user in and returns their bearer token.
    pub async fn token_for(&self, email: &str) -> String {
        self.services
            .auth
            .login(LoginRequest {
                email: email.to_string(),
                password: "correct horse battery".to_string(),
            })
            .await
            .expect("failed to log test user in")
            .token
    }

    pub async fn seed_supplier(&self, name: &str) -> supplier::Model {
        self.services
            .suppliers
            .create(CreateSupplierRequest {
                name: name.to_string(),
                contact_person: None,
                email: None,
                phone: None,
                address: None,
            })
            .await
            .expect("failed to seed supplier")
    }

    pub async fn seed_medicine(&self, name: &str, price: Decimal, stock: i32) -> medicine::Model {
        self.services
            .medicines
            .create(CreateMedicineRequest {
                name: name.to_string(),
                description: None,
                category: Some("analgesic".to_string()),
                price,
                stock_quantity: stock,
                manufacturer: None,
                expiry_date: far_future(),
            })
            .await
            .expect("failed to seed medicine")
    }

    /// Sends one request through the router and returns status and JSON body.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response was not JSON")
        };
        (status, value)
    }
}

pub fn far_future() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(365)
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Reads a Decimal out of a JSON response field, whether it was serialized as
/// a string or a number.
pub fn decimal_field(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("field was not a decimal"),
        other => other
            .to_string()
            .parse()
            .expect("field was not a decimal"),
    }
}
