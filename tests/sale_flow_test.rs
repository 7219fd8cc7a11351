mod common;

use common::{decimal_field, today, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use pharmacy_api::entities::{sale, sale_item};

#[tokio::test]
async fn sale_charges_recommended_price_and_decrements_stock() {
    let app = TestApp::new().await;
    app.register_user("bob", "bob@example.com", "pharmacist").await;
    let token = app.token_for("bob@example.com").await;

    // price 100 yields a recommended price of 130
    let medicine = app.seed_medicine("Paracetamol", dec!(100), 20).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/sales",
            Some(&token),
            Some(json!({
                "sale_date": today(),
                "customer_name": "Walk-in",
                "items": [
                    { "medicine_id": medicine.id, "quantity": 2 }
                ]
            })),
        )
        .await;
    assert_eq!(status, 201, "unexpected response: {body}");
    assert_eq!(decimal_field(&body["sale"]["total_amount"]), dec!(260));
    assert_eq!(decimal_field(&body["sale"]["items"][0]["unit_price"]), dec!(130));
    assert_eq!(body["sale"]["sold_by"], "bob");

    let after = app.services.medicines.get(medicine.id).await.unwrap();
    assert_eq!(after.stock_quantity, 18);
}

#[tokio::test]
async fn insufficient_stock_aborts_the_whole_sale() {
    let app = TestApp::new().await;
    app.register_user("bob", "bob@example.com", "pharmacist").await;
    let token = app.token_for("bob@example.com").await;

    let medicine = app.seed_medicine("Amoxicillin", dec!(10), 5).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/sales",
            Some(&token),
            Some(json!({
                "sale_date": today(),
                "customer_name": "Walk-in",
                "items": [
                    { "medicine_id": medicine.id, "quantity": 10 }
                ]
            })),
        )
        .await;
    assert_eq!(status, 400, "unexpected response: {body}");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Insufficient stock"));

    let untouched = app.services.medicines.get(medicine.id).await.unwrap();
    assert_eq!(untouched.stock_quantity, 5);

    // No header or line rows survive the rollback.
    assert_eq!(sale::Entity::find().count(app.db.as_ref()).await.unwrap(), 0);
    assert_eq!(
        sale_item::Entity::find().count(app.db.as_ref()).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn failing_line_rolls_back_earlier_lines() {
    let app = TestApp::new().await;
    app.register_user("bob", "bob@example.com", "pharmacist").await;
    let token = app.token_for("bob@example.com").await;

    let plenty = app.seed_medicine("Paracetamol", dec!(10), 50).await;
    let scarce = app.seed_medicine("Insulin", dec!(10), 1).await;

    let (status, _) = app
        .request(
            "POST",
            "/api/sales",
            Some(&token),
            Some(json!({
                "sale_date": today(),
                "customer_name": "Walk-in",
                "items": [
                    { "medicine_id": plenty.id, "quantity": 5 },
                    { "medicine_id": scarce.id, "quantity": 3 }
                ]
            })),
        )
        .await;
    assert_eq!(status, 400);

    // The first line's decrement was rolled back with the rest.
    let first = app.services.medicines.get(plenty.id).await.unwrap();
    assert_eq!(first.stock_quantity, 50);
    let second = app.services.medicines.get(scarce.id).await.unwrap();
    assert_eq!(second.stock_quantity, 1);
}

#[tokio::test]
async fn sale_update_reverses_then_reapplies() {
    let app = TestApp::new().await;
    app.register_user("bob", "bob@example.com", "pharmacist").await;
    let token = app.token_for("bob@example.com").await;

    let medicine = app.seed_medicine("Paracetamol", dec!(100), 20).await;

    let (_, body) = app
        .request(
            "POST",
            "/api/sales",
            Some(&token),
            Some(json!({
                "sale_date": today(),
                "customer_name": "Walk-in",
                "items": [
                    { "medicine_id": medicine.id, "quantity": 2 }
                ]
            })),
        )
        .await;
    let sale_id = body["sale"]["id"].as_i64().unwrap();

    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/sales/{sale_id}"),
            Some(&token),
            Some(json!({
                "sale_date": today(),
                "customer_name": "Walk-in",
                "items": [
                    { "medicine_id": medicine.id, "quantity": 4 }
                ]
            })),
        )
        .await;
    assert_eq!(status, 200, "unexpected response: {body}");
    assert_eq!(decimal_field(&body["sale"]["total_amount"]), dec!(520));

    let after = app.services.medicines.get(medicine.id).await.unwrap();
    assert_eq!(after.stock_quantity, 16);
}

#[tokio::test]
async fn sale_delete_puts_stock_back() {
    let app = TestApp::new().await;
    app.register_user("bob", "bob@example.com", "pharmacist").await;
    let token = app.token_for("bob@example.com").await;

    let medicine = app.seed_medicine("Paracetamol", dec!(100), 20).await;

    let (_, body) = app
        .request(
            "POST",
            "/api/sales",
            Some(&token),
            Some(json!({
                "sale_date": today(),
                "customer_name": "Walk-in",
                "items": [
                    { "medicine_id": medicine.id, "quantity": 3 }
                ]
            })),
        )
        .await;
    let sale_id = body["sale"]["id"].as_i64().unwrap();

    let (status, _) = app
        .request("DELETE", &format!("/api/sales/{sale_id}"), Some(&token), None)
        .await;
    assert_eq!(status, 200);

    let restored = app.services.medicines.get(medicine.id).await.unwrap();
    assert_eq!(restored.stock_quantity, 20);

    let (status, _) = app
        .request("GET", &format!("/api/sales/{sale_id}"), Some(&token), None)
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn sale_against_unknown_medicine_is_not_found() {
    let app = TestApp::new().await;
    app.register_user("bob", "bob@example.com", "pharmacist").await;
    let token = app.token_for("bob@example.com").await;

    let (status, _) = app
        .request(
            "POST",
            "/api/sales",
            Some(&token),
            Some(json!({
                "sale_date": today(),
                "customer_name": "Walk-in",
                "items": [
                    { "medicine_id": 424242, "quantity": 1 }
                ]
            })),
        )
        .await;
    assert_eq!(status, 404);
}
