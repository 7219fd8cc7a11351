mod common;

use chrono::Duration;
use common::{today, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

use pharmacy_api::services::medicines::CreateMedicineRequest;
use pharmacy_api::services::purchases::{CreatePurchaseRequest, PurchaseItemRequest};
use pharmacy_api::services::sales::{CreateSaleRequest, SaleItemRequest};

async fn seed_trading_day(app: &TestApp, user_id: i32) -> (i32, i32) {
    let supplier = app.seed_supplier("MediSource").await;
    let paracetamol = app.seed_medicine("Paracetamol", dec!(10), 0).await;
    let ibuprofen = app.seed_medicine("Ibuprofen", dec!(10), 0).await;

    // Restock both at 100 a unit, which reprices them to 130 recommended.
    app.services
        .purchases
        .create(CreatePurchaseRequest {
            supplier_id: supplier.id,
            purchase_date: today(),
            status: None,
            items: vec![
                PurchaseItemRequest {
                    medicine_id: paracetamol.id,
                    quantity: 50,
                    unit_price: dec!(100),
                },
                PurchaseItemRequest {
                    medicine_id: ibuprofen.id,
                    quantity: 50,
                    unit_price: dec!(100),
                },
            ],
        })
        .await
        .unwrap();

    // Paracetamol outsells ibuprofen three units to one.
    app.services
        .sales
        .create(
            user_id,
            CreateSaleRequest {
                sale_date: today(),
                customer_name: "Walk-in".to_string(),
                status: None,
                items: vec![
                    SaleItemRequest {
                        medicine_id: paracetamol.id,
                        quantity: 3,
                    },
                    SaleItemRequest {
                        medicine_id: ibuprofen.id,
                        quantity: 1,
                    },
                ],
            },
        )
        .await
        .unwrap();

    (paracetamol.id, ibuprofen.id)
}

#[tokio::test]
async fn home_reports_window_totals_and_rankings() {
    let app = TestApp::new().await;
    let user_id = app.register_user("alice", "alice@example.com", "admin").await;
    let token = app.token_for("alice@example.com").await;
    let (paracetamol_id, _) = seed_trading_day(&app, user_id).await;

    let (status, body) = app
        .request(
            "GET",
            &format!("/api/home?start_date={}&end_date={}", today(), today()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, 200, "unexpected response: {body}");

    let data = &body["data"];
    assert_eq!(data["inventory"]["total_medicines"], 2);
    assert_eq!(data["inventory"]["total_suppliers"], 1);
    assert_eq!(data["inventory"]["total_stock"], 50 + 50 - 4);

    // 4 units at the 130 recommended price.
    assert_eq!(data["period"]["sales_count"]["current"], 1);
    assert_eq!(data["period"]["revenue"]["current"], "520.00");
    assert_eq!(data["period"]["expenses"]["current"], "10000.00");
    // Cost price is 100, so profit is 4 x 30.
    assert_eq!(data["period"]["profit"]["current"], "120.00");
    // Nothing happened in the preceding window.
    assert_eq!(data["period"]["revenue"]["change_percent"], "100");

    let ranking = data["pharmacist_ranking"].as_array().unwrap();
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0]["username"], "alice");
    assert_eq!(ranking[0]["sales_count"], 1);
    assert_eq!(ranking[0]["total"], "520.00");

    let best = data["best_sellers"].as_array().unwrap();
    assert_eq!(best[0]["medicine_id"], paracetamol_id);
    assert_eq!(best[0]["quantity_sold"], 3);

    let chart = data["chart"].as_array().unwrap();
    assert_eq!(chart.len(), 1);
    assert_eq!(chart[0]["revenue"], "520.00");
    assert_eq!(chart[0]["expenses"], "10000.00");
}

#[tokio::test]
async fn profit_report_breaks_down_by_medicine() {
    let app = TestApp::new().await;
    let user_id = app.register_user("alice", "alice@example.com", "admin").await;
    let token = app.token_for("alice@example.com").await;
    let (paracetamol_id, _) = seed_trading_day(&app, user_id).await;

    let (status, body) = app
        .request(
            "GET",
            &format!(
                "/api/report/profit?start_date={}&end_date={}",
                today(),
                today()
            ),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, 200, "unexpected response: {body}");

    let data = &body["data"];
    assert_eq!(data["total_revenue"], "520.00");
    assert_eq!(data["total_expenses"], "10000.00");
    assert_eq!(data["total_profit"], "120.00");

    let rows = data["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["medicine_id"], paracetamol_id);
    assert_eq!(rows[0]["units_sold"], 3);
    assert_eq!(rows[0]["revenue"], "390.00");
    assert_eq!(rows[0]["profit"], "90.00");
}

#[tokio::test]
async fn inventory_report_tracks_movements() {
    let app = TestApp::new().await;
    let user_id = app.register_user("alice", "alice@example.com", "admin").await;
    let token = app.token_for("alice@example.com").await;
    let (paracetamol_id, _) = seed_trading_day(&app, user_id).await;

    let (status, body) = app
        .request("GET", "/api/report/inventory", Some(&token), None)
        .await;
    assert_eq!(status, 200);

    let rows = body["data"].as_array().unwrap();
    let row = rows
        .iter()
        .find(|r| r["medicine_id"] == paracetamol_id)
        .unwrap();
    assert_eq!(row["purchased_quantity"], 50);
    assert_eq!(row["sold_quantity"], 3);
    assert_eq!(row["stock_quantity"], 47);
}

#[tokio::test]
async fn expiration_report_classifies_medicines() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;
    let token = app.token_for("alice@example.com").await;

    for (name, offset_days) in [("Old stock", -10), ("Short dated", 5), ("Fresh", 200)] {
        app.services
            .medicines
            .create(CreateMedicineRequest {
                name: name.to_string(),
                description: None,
                category: None,
                price: dec!(10),
                stock_quantity: 1,
                manufacturer: None,
                expiry_date: today() + Duration::days(offset_days),
            })
            .await
            .unwrap();
    }

    let (status, body) = app
        .request(
            "GET",
            &format!(
                "/api/report/expiration?start_date={}&end_date={}",
                today() - Duration::days(30),
                today() + Duration::days(365)
            ),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, 200, "unexpected response: {body}");

    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    let status_of = |name: &str| {
        rows.iter()
            .find(|r| r["name"] == name)
            .unwrap()["status"]
            .clone()
    };
    assert_eq!(status_of("Old stock"), json!("Expired"));
    assert_eq!(status_of("Short dated"), json!("Expiring Soon"));
    assert_eq!(status_of("Fresh"), json!("Valid"));
}

#[tokio::test]
async fn sales_report_filters_by_user() {
    let app = TestApp::new().await;
    let alice = app.register_user("alice", "alice@example.com", "admin").await;
    let bob = app.register_user("bob", "bob@example.com", "pharmacist").await;
    let token = app.token_for("alice@example.com").await;

    let medicine = app.seed_medicine("Paracetamol", dec!(10), 100).await;
    for user_id in [alice, bob] {
        app.services
            .sales
            .create(
                user_id,
                CreateSaleRequest {
                    sale_date: today(),
                    customer_name: "Walk-in".to_string(),
                    status: None,
                    items: vec![SaleItemRequest {
                        medicine_id: medicine.id,
                        quantity: 1,
                    }],
                },
            )
            .await
            .unwrap();
    }

    let (status, body) = app
        .request(
            "GET",
            &format!(
                "/api/report/sales?start_date={}&end_date={}&user_id={}",
                today(),
                today(),
                bob
            ),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, 200);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["sold_by"], "bob");
    assert_eq!(rows[0]["role"], "pharmacist");
    assert_eq!(rows[0]["items"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .request(
            "GET",
            &format!(
                "/api/report/sales?start_date={}&end_date={}&role=pharmacist",
                today(),
                today()
            ),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, 200);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["sold_by"], "bob");
}
