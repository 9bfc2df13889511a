//! End-to-end test over a real socket with `reqwest`.

#![allow(clippy::panic)]

mod common;

use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn concurrent_withdrawals_never_overdraw() {
    let (addr, store) = common::spawn_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api/v1");
    let user = Uuid::new_v4();

    store
        .set_kyc_level(
            wager_ledger::domain::UserId::from_uuid(user),
            wager_ledger::domain::KycLevel::Full,
        )
        .await;

    // 100 deposit + 200 bonus = 300
    let Ok(resp) = client
        .post(format!("{base}/wallet/deposit"))
        .json(&json!({ "user_id": user, "amount": "100", "method": "nagad", "language": "en" }))
        .send()
        .await
    else {
        panic!("deposit request failed");
    };
    assert!(resp.status().is_success());

    let attempts = (0..5).map(|i| {
        let client = client.clone();
        let url = format!("{base}/wallet/withdraw");
        async move {
            client
                .post(url)
                .json(&json!({ "user_id": user, "amount": "100", "idempotency_key": format!("w{i}") }))
                .send()
                .await
                .map(|r| r.status().is_success())
                .unwrap_or(false)
        }
    });
    let results = futures_util::future::join_all(attempts).await;
    let succeeded = results.iter().filter(|ok| **ok).count();
    assert_eq!(succeeded, 3);

    let Ok(resp) = client.get(format!("{base}/wallets/{user}")).send().await else {
        panic!("wallet request failed");
    };
    let Ok(body) = resp.json::<Value>().await else {
        panic!("wallet body invalid");
    };
    assert_eq!(body["wallet"]["balance"], "0");
    assert_eq!(body["wallet"]["total_withdrawn"], "300");
}
