mod common;

use common::{decimal_field, today, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn purchase_restocks_and_reprices_the_medicine() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;
    let token = app.token_for("alice@example.com").await;

    let supplier = app.seed_supplier("MediSource").await;
    let medicine = app.seed_medicine("Paracetamol", dec!(50), 20).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/purchases",
            Some(&token),
            Some(json!({
                "supplier_id": supplier.id,
                "purchase_date": today(),
                "items": [
                    { "medicine_id": medicine.id, "quantity": 10, "unit_price": 100 }
                ]
            })),
        )
        .await;
    assert_eq!(status, 201, "unexpected response: {body}");
    assert_eq!(decimal_field(&body["purchase"]["total_amount"]), dec!(1000));
    assert_eq!(body["purchase"]["supplier_name"], "MediSource");
    assert_eq!(body["purchase"]["items"][0]["medicine_name"], "Paracetamol");

    let restocked = app.services.medicines.get(medicine.id).await.unwrap();
    assert_eq!(restocked.stock_quantity, 30);
    assert_eq!(restocked.price, dec!(100));
    assert_eq!(restocked.recommended_price, dec!(130.00));
}

#[tokio::test]
async fn purchase_line_totals_are_rounded_before_summing() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;

    let supplier = app.seed_supplier("MediSource").await;
    let a = app.seed_medicine("Ibuprofen", dec!(1), 0).await;
    let b = app.seed_medicine("Aspirin", dec!(1), 0).await;

    let purchase = app
        .services
        .purchases
        .create(pharmacy_api::services::purchases::CreatePurchaseRequest {
            supplier_id: supplier.id,
            purchase_date: today(),
            status: None,
            items: vec![
                pharmacy_api::services::purchases::PurchaseItemRequest {
                    medicine_id: a.id,
                    quantity: 3,
                    unit_price: dec!(0.335),
                },
                pharmacy_api::services::purchases::PurchaseItemRequest {
                    medicine_id: b.id,
                    quantity: 1,
                    unit_price: dec!(2.005),
                },
            ],
        })
        .await
        .unwrap();

    // 3 x 0.335 = 1.005 -> 1.00 (banker's rounding), 1 x 2.005 -> 2.00
    assert_eq!(purchase.items[0].total_price, dec!(1.00));
    assert_eq!(purchase.items[1].total_price, dec!(2.00));
    assert_eq!(purchase.purchase.total_amount, dec!(3.00));
}

#[tokio::test]
async fn purchase_update_reverses_then_reapplies_stock() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;
    let token = app.token_for("alice@example.com").await;

    let supplier = app.seed_supplier("MediSource").await;
    let medicine = app.seed_medicine("Paracetamol", dec!(50), 20).await;

    let (_, body) = app
        .request(
            "POST",
            "/api/purchases",
            Some(&token),
            Some(json!({
                "supplier_id": supplier.id,
                "purchase_date": today(),
                "items": [
                    { "medicine_id": medicine.id, "quantity": 10, "unit_price": 100 }
                ]
            })),
        )
        .await;
    let purchase_id = body["purchase"]["id"].as_i64().unwrap();

    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/purchases/{purchase_id}"),
            Some(&token),
            Some(json!({
                "supplier_id": supplier.id,
                "purchase_date": today(),
                "items": [
                    { "medicine_id": medicine.id, "quantity": 5, "unit_price": 80 }
                ]
            })),
        )
        .await;
    assert_eq!(status, 200, "unexpected response: {body}");
    assert_eq!(decimal_field(&body["purchase"]["total_amount"]), dec!(400));

    let updated = app.services.medicines.get(medicine.id).await.unwrap();
    assert_eq!(updated.stock_quantity, 25);
    assert_eq!(updated.price, dec!(80));
    assert_eq!(updated.recommended_price, dec!(104.00));
}

#[tokio::test]
async fn purchase_delete_restores_pre_purchase_stock() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;
    let token = app.token_for("alice@example.com").await;

    let supplier = app.seed_supplier("MediSource").await;
    let medicine = app.seed_medicine("Paracetamol", dec!(50), 20).await;

    let (_, body) = app
        .request(
            "POST",
            "/api/purchases",
            Some(&token),
            Some(json!({
                "supplier_id": supplier.id,
                "purchase_date": today(),
                "items": [
                    { "medicine_id": medicine.id, "quantity": 10, "unit_price": 100 }
                ]
            })),
        )
        .await;
    let purchase_id = body["purchase"]["id"].as_i64().unwrap();

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/api/purchases/{purchase_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, 200);

    let restored = app.services.medicines.get(medicine.id).await.unwrap();
    assert_eq!(restored.stock_quantity, 20);

    let (status, _) = app
        .request(
            "GET",
            &format!("/api/purchases/{purchase_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn purchase_against_missing_references_is_not_found() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;
    let token = app.token_for("alice@example.com").await;

    let supplier = app.seed_supplier("MediSource").await;
    let medicine = app.seed_medicine("Paracetamol", dec!(50), 20).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/purchases",
            Some(&token),
            Some(json!({
                "supplier_id": 9999,
                "purchase_date": today(),
                "items": [
                    { "medicine_id": medicine.id, "quantity": 1, "unit_price": 10 }
                ]
            })),
        )
        .await;
    assert_eq!(status, 404, "unexpected response: {body}");

    let (status, body) = app
        .request(
            "POST",
            "/api/purchases",
            Some(&token),
            Some(json!({
                "supplier_id": supplier.id,
                "purchase_date": today(),
                "items": [
                    { "medicine_id": 9999, "quantity": 1, "unit_price": 10 }
                ]
            })),
        )
        .await;
    assert_eq!(status, 404, "unexpected response: {body}");

    // The aborted purchase must leave stock and pricing untouched.
    let untouched = app.services.medicines.get(medicine.id).await.unwrap();
    assert_eq!(untouched.stock_quantity, 20);
    assert_eq!(untouched.price, dec!(50));
}

#[tokio::test]
async fn purchase_list_is_paginated_with_fixed_page_size() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;
    let token = app.token_for("alice@example.com").await;

    let supplier = app.seed_supplier("MediSource").await;
    let medicine = app.seed_medicine("Paracetamol", dec!(50), 0).await;

    for _ in 0..12 {
        app.services
            .purchases
            .create(pharmacy_api::services::purchases::CreatePurchaseRequest {
                supplier_id: supplier.id,
                purchase_date: today(),
                status: None,
                items: vec![pharmacy_api::services::purchases::PurchaseItemRequest {
                    medicine_id: medicine.id,
                    quantity: 1,
                    unit_price: dec!(10),
                }],
            })
            .await
            .unwrap();
    }

    let (status, body) = app
        .request("GET", "/api/purchases?page=2", Some(&token), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["meta"]["total"], 12);
    assert_eq!(body["data"]["page"]["current"], 2);
    assert_eq!(body["data"]["page"]["total"], 2);
    assert_eq!(body["data"]["page"]["size"], 10);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 2);
}
