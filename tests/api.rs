//! Router-level tests driven through `tower::ServiceExt::oneshot`.

#![allow(clippy::panic)]

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use wager_ledger::domain::{
    Contest, ContestId, ContestStatus, KycLevel, Prediction, PredictionId, PredictionStatus, UserId,
};

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    let Ok(request) = request else {
        panic!("request build failed");
    };
    let Ok(response) = app.clone().oneshot(request).await else {
        panic!("router failed");
    };
    let status = response.status();
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body read failed");
    };
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn deposit_body(user: Uuid, amount: &str, method: &str) -> Value {
    json!({ "user_id": user, "amount": amount, "method": method, "language": "en" })
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _) = common::test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store_reachable"], true);
    assert_eq!(body["auto_grading_enabled"], false);
}

#[tokio::test]
async fn first_deposit_bonus_then_plain_deposit() {
    let (app, _) = common::test_app();
    let user = Uuid::new_v4();

    let (status, first) = send(
        &app,
        "POST",
        "/api/v1/wallet/deposit",
        Some(deposit_body(user, "500", "bkash")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["bonus"], "1000");
    assert_eq!(first["new_balance"], "1500");

    let (_, second) = send(
        &app,
        "POST",
        "/api/v1/wallet/deposit",
        Some(deposit_body(user, "500", "nagad")),
    )
    .await;
    assert_eq!(second["bonus"], Value::Null);

    let (status, wallet) = send(&app, "GET", &format!("/api/v1/wallets/{user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wallet["wallet"]["balance"], "2000");
}

#[tokio::test]
async fn unsupported_method_is_bad_request() {
    let (app, _) = common::test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/wallet/deposit",
        Some(deposit_body(Uuid::new_v4(), "500", "paypal")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 1002);
}

#[tokio::test]
async fn withdrawal_policy_errors_map_to_statuses() {
    let (app, store) = common::test_app();
    let user = Uuid::new_v4();
    let _ = send(
        &app,
        "POST",
        "/api/v1/wallet/deposit",
        Some(deposit_body(user, "500", "usdt")),
    )
    .await;

    let withdraw = |amount: &str| json!({ "user_id": user, "amount": amount });

    let (status, _) = send(&app, "POST", "/api/v1/wallet/withdraw", Some(withdraw("50"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/v1/wallet/withdraw", Some(withdraw("9000"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&app, "POST", "/api/v1/wallet/withdraw", Some(withdraw("100"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 4002);

    store
        .set_kyc_level(UserId::from_uuid(user), KycLevel::Full)
        .await;
    let (status, body) = send(&app, "POST", "/api/v1/wallet/withdraw", Some(withdraw("150"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_balance"], "1350");
}

#[tokio::test]
async fn keyed_withdrawal_retry_returns_original() {
    let (app, store) = common::test_app();
    let user = Uuid::new_v4();
    let _ = send(
        &app,
        "POST",
        "/api/v1/wallet/deposit",
        Some(deposit_body(user, "500", "bkash")),
    )
    .await;
    store
        .set_kyc_level(UserId::from_uuid(user), KycLevel::Basic)
        .await;

    let request = json!({ "user_id": user, "amount": "100", "idempotency_key": "payout-1" });
    let (status, first) = send(&app, "POST", "/api/v1/wallet/withdraw", Some(request.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["new_balance"], "1400");

    let (status, retry) = send(&app, "POST", "/api/v1/wallet/withdraw", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(retry["new_balance"], "1400");

    let (_, wallet) = send(&app, "GET", &format!("/api/v1/wallets/{user}"), None).await;
    assert_eq!(wallet["wallet"]["total_withdrawn"], "100");
}

#[tokio::test]
async fn transactions_are_paginated() {
    let (app, _) = common::test_app();
    let user = Uuid::new_v4();
    for _ in 0..3 {
        let _ = send(
            &app,
            "POST",
            "/api/v1/wallet/deposit",
            Some(deposit_body(user, "100", "bkash")),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/wallets/{user}/transactions?page=1&per_page=2"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().map(Vec::len), Some(2));
    // three deposits plus one welcome bonus
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["total_pages"], 2);
}

#[tokio::test]
async fn grading_pays_winners_and_rejects_regrade() {
    let (app, store) = common::test_app();
    let contest_id = ContestId::new();
    store
        .insert_contest(Contest {
            id: contest_id,
            title: "Derby".to_string(),
            status: ContestStatus::Open,
            result: None,
            closes_at: None,
            graded_at: None,
        })
        .await;
    let winner = UserId::new();
    for (user, pick) in [(winner, "Over 2.5"), (UserId::new(), "Under 1.5")] {
        store
            .insert_prediction(Prediction {
                id: PredictionId::new(),
                contest_id,
                user_id: user,
                prediction_data: json!({ "selection": pick }),
                bet_amount: Decimal::from(100),
                potential_payout: None,
                status: PredictionStatus::Pending,
                actual_payout: None,
            })
            .await;
    }

    let body = json!({ "contest_id": contest_id, "result": "Over" });
    let (status, graded) = send(&app, "POST", "/api/v1/grading", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graded["winners_count"], 1);
    assert_eq!(graded["total_predictions"], 2);
    assert_eq!(graded["total_payout"], "180.0");
    assert_eq!(store.ledger_sum(winner).await, Decimal::from(180));

    let (status, again) = send(&app, "POST", "/api/v1/grading", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["code"], 2003);
}

#[tokio::test]
async fn auto_grading_respects_switch() {
    let (app, _) = common::test_app();
    let (status, body) = send(&app, "POST", "/api/v1/grading/auto", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["skipped"], true);

    let toggle = json!({ "admin_id": Uuid::new_v4(), "enabled": true });
    let (status, _) = send(&app, "PUT", "/api/v1/admin/auto-grading", Some(toggle)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "POST", "/api/v1/grading/auto", None).await;
    assert_eq!(body["result"]["skipped"], false);
}

#[tokio::test]
async fn admin_adjustment_is_audited() {
    let (app, _) = common::test_app();
    let admin = Uuid::new_v4();
    let user = Uuid::new_v4();

    let credit = json!({
        "admin_id": admin,
        "user_id": user,
        "amount": "250",
        "description": "goodwill credit"
    });
    let (status, body) = send(&app, "POST", "/api/v1/admin/wallets/adjust", Some(credit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction_type"], "admin_credit");
    assert_eq!(body["new_balance"], "250");

    let overdraw = json!({
        "admin_id": admin,
        "user_id": user,
        "amount": "-1000",
        "description": "reversal"
    });
    let (status, _) = send(&app, "POST", "/api/v1/admin/wallets/adjust", Some(overdraw)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, logs) = send(&app, "GET", "/api/v1/admin/logs", None).await;
    assert_eq!(logs["pagination"]["total"], 2);
}

#[tokio::test]
async fn unknown_wallet_is_not_found() {
    let (app, _) = common::test_app();
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/wallets/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 2001);
}
