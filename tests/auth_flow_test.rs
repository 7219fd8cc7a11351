mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use serde_json::json;

use pharmacy_api::entities::password_reset_token;

#[tokio::test]
async fn register_then_login_issues_a_usable_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "correct horse battery",
                "role_name": "admin"
            })),
        )
        .await;
    assert_eq!(status, 201, "unexpected response: {body}");
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({
                "email": "alice@example.com",
                "password": "correct horse battery"
            })),
        )
        .await;
    assert_eq!(status, 200);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .request("GET", "/api/medicines", Some(&token), None)
        .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn duplicate_registrations_are_rejected() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "alice",
                "email": "other@example.com",
                "password": "irrelevant password",
                "role_name": "admin"
            })),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Username already exists");

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "alice2",
                "email": "alice@example.com",
                "password": "irrelevant password",
                "role_name": "admin"
            })),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Email already exists");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;

    let (status, _) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({
                "email": "alice@example.com",
                "password": "wrong password entirely"
            })),
        )
        .await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn missing_and_foreign_role_tokens_are_rejected() {
    let app = TestApp::new().await;
    app.register_user("ivan", "ivan@example.com", "inventory_manager")
        .await;
    let inventory_token = app.token_for("ivan@example.com").await;
    app.register_user("paula", "paula@example.com", "pharmacist")
        .await;
    let pharmacist_token = app.token_for("paula@example.com").await;

    // No token at all.
    let (status, _) = app.request("GET", "/api/medicines", None, None).await;
    assert_eq!(status, 401);

    // Inventory managers handle suppliers, not medicines.
    let (status, _) = app
        .request("GET", "/api/medicines", Some(&inventory_token), None)
        .await;
    assert_eq!(status, 403);
    let (status, _) = app
        .request("GET", "/api/suppliers", Some(&inventory_token), None)
        .await;
    assert_eq!(status, 200);

    // Pharmacists are the other way around.
    let (status, _) = app
        .request("GET", "/api/suppliers", Some(&pharmacist_token), None)
        .await;
    assert_eq!(status, 403);
    let (status, _) = app
        .request("GET", "/api/medicines", Some(&pharmacist_token), None)
        .await;
    assert_eq!(status, 200);

    // User administration is admin-only.
    let (status, _) = app
        .request("GET", "/api/users", Some(&pharmacist_token), None)
        .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn any_authenticated_role_reaches_their_profile() {
    let app = TestApp::new().await;
    app.register_user("ivan", "ivan@example.com", "inventory_manager")
        .await;
    let token = app.token_for("ivan@example.com").await;

    let (status, body) = app
        .request("GET", "/api/users/profile", Some(&token), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["user"]["username"], "ivan");
    assert_eq!(body["user"]["role"], "inventory_manager");
}

#[tokio::test]
async fn password_reset_round_trip() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;

    let (status, _) = app
        .request(
            "POST",
            "/api/users/forgot-password",
            None,
            Some(json!({ "email": "alice@example.com" })),
        )
        .await;
    assert_eq!(status, 200);

    // The mailer is a log stub in tests; read the OTP from the token table.
    let token_row = password_reset_token::Entity::find()
        .one(app.db.as_ref())
        .await
        .unwrap()
        .expect("a reset token should exist");
    assert_eq!(token_row.token.len(), 5);

    let (status, body) = app
        .request(
            "POST",
            "/api/users/reset-password",
            None,
            Some(json!({
                "email": "alice@example.com",
                "otp": token_row.token,
                "new_password": "a brand new password"
            })),
        )
        .await;
    assert_eq!(status, 200, "unexpected response: {body}");

    // Token is single use.
    assert_eq!(
        password_reset_token::Entity::find()
            .count(app.db.as_ref())
            .await
            .unwrap(),
        0
    );

    // Old password no longer works, new one does.
    let (status, _) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({
                "email": "alice@example.com",
                "password": "correct horse battery"
            })),
        )
        .await;
    assert_eq!(status, 401);
    let (status, _) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({
                "email": "alice@example.com",
                "password": "a brand new password"
            })),
        )
        .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn expired_otp_fails_and_is_deleted() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;

    app.services
        .password_reset
        .forgot_password("alice@example.com")
        .await
        .unwrap();

    let token_row = password_reset_token::Entity::find()
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    let otp = token_row.token.clone();

    let mut expired: password_reset_token::ActiveModel = token_row.into();
    expired.expires_at = Set(Utc::now() - Duration::minutes(1));
    expired.update(app.db.as_ref()).await.unwrap();

    let (status, body) = app
        .request(
            "POST",
            "/api/users/reset-password",
            None,
            Some(json!({
                "email": "alice@example.com",
                "otp": otp,
                "new_password": "a brand new password"
            })),
        )
        .await;
    assert_eq!(status, 400);
    assert!(body["message"].as_str().unwrap().contains("Expired OTP"));

    assert_eq!(
        password_reset_token::Entity::find()
            .count(app.db.as_ref())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn requesting_a_new_otp_replaces_the_old_one() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;

    app.services
        .password_reset
        .forgot_password("alice@example.com")
        .await
        .unwrap();
    app.services
        .password_reset
        .forgot_password("alice@example.com")
        .await
        .unwrap();

    assert_eq!(
        password_reset_token::Entity::find()
            .count(app.db.as_ref())
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;
    let token = app.token_for("alice@example.com").await;

    let (status, _) = app
        .request(
            "PUT",
            "/api/users/profile/password",
            Some(&token),
            Some(json!({
                "current_password": "not the right one",
                "new_password": "whatever comes next"
            })),
        )
        .await;
    assert_eq!(status, 401);

    let (status, _) = app
        .request(
            "PUT",
            "/api/users/profile/password",
            Some(&token),
            Some(json!({
                "current_password": "correct horse battery",
                "new_password": "whatever comes next"
            })),
        )
        .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn unknown_role_name_is_rejected_at_registration() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "mallory",
                "email": "mallory@example.com",
                "password": "some password here",
                "role_name": "superuser"
            })),
        )
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn medicine_validation_errors_are_bad_requests() {
    let app = TestApp::new().await;
    app.register_user("alice", "alice@example.com", "admin").await;
    let token = app.token_for("alice@example.com").await;

    let (status, _) = app
        .request(
            "POST",
            "/api/medicines",
            Some(&token),
            Some(json!({
                "name": "",
                "price": dec!(10),
                "stock_quantity": 5,
                "expiry_date": common::far_future()
            })),
        )
        .await;
    assert_eq!(status, 400);
}
