pub mod auth;
pub mod common;
pub mod dashboard;
pub mod medicines;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod suppliers;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router};

use crate::auth::{AuthConfig, AuthRouterExt, AuthService, Role};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::notifications::OtpMailer;
use crate::services::{
    dashboard::DashboardService, medicines::MedicineService,
    password_reset::PasswordResetService, purchases::PurchaseService, reports::ReportService,
    sales::SaleService, suppliers::SupplierService, users::UserService,
};

pub(crate) const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub(crate) const ADMIN_AND_PHARMACIST: &[Role] = &[Role::Admin, Role::Pharmacist];
pub(crate) const ADMIN_AND_INVENTORY: &[Role] = &[Role::Admin, Role::InventoryManager];

/// Services layer handed to every HTTP handler through router state.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub medicines: Arc<MedicineService>,
    pub suppliers: Arc<SupplierService>,
    pub purchases: Arc<PurchaseService>,
    pub sales: Arc<SaleService>,
    pub dashboard: Arc<DashboardService>,
    pub reports: Arc<ReportService>,
    pub password_reset: Arc<PasswordResetService>,
}

impl AppServices {
    pub fn build(
        db: Arc<DbPool>,
        config: &AppConfig,
        event_sender: Arc<EventSender>,
        mailer: Arc<dyn OtpMailer>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            AuthConfig::new(
                config.jwt_secret.clone(),
                Duration::from_secs(config.jwt_expiration_secs),
            ),
            db.clone(),
        ));
        let password_reset = Arc::new(PasswordResetService::new(
            db.clone(),
            auth.clone(),
            mailer,
            event_sender.clone(),
            Duration::from_secs(config.otp_ttl_minutes.max(0) as u64 * 60),
        ));

        Self {
            users: Arc::new(UserService::new(db.clone(), auth.clone())),
            medicines: Arc::new(MedicineService::new(db.clone(), event_sender.clone())),
            suppliers: Arc::new(SupplierService::new(db.clone(), event_sender.clone())),
            purchases: Arc::new(PurchaseService::new(db.clone(), event_sender.clone())),
            sales: Arc::new(SaleService::new(db.clone(), event_sender)),
            dashboard: Arc::new(DashboardService::new(db.clone())),
            reports: Arc::new(ReportService::new(db)),
            password_reset,
            auth,
        }
    }
}

/// Assembles the `/api` surface with per-section role allow-lists.
pub fn api_router(services: AppServices) -> Router {
    let auth_service = services.auth.clone();
    let state = Arc::new(services);

    let api = Router::new()
        .nest("/auth", auth::routes())
        .nest("/users", users::routes())
        .nest(
            "/medicines",
            medicines::routes().with_roles(ADMIN_AND_PHARMACIST),
        )
        .nest(
            "/suppliers",
            suppliers::routes().with_roles(ADMIN_AND_INVENTORY),
        )
        .nest(
            "/purchases",
            purchases::routes().with_roles(ADMIN_AND_PHARMACIST),
        )
        .nest("/sales", sales::routes().with_roles(ADMIN_AND_PHARMACIST))
        .nest(
            "/home",
            dashboard::routes().with_roles(ADMIN_AND_PHARMACIST),
        )
        .nest(
            "/report",
            reports::routes().with_roles(ADMIN_AND_PHARMACIST),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(Extension(auth_service))
}
