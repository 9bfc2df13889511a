//! WebSocket subscription test with `tokio-tungstenite`.

#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

#[tokio::test]
async fn subscriber_receives_balance_events_for_followed_user() {
    let (addr, _) = common::spawn_server().await;
    let Ok((mut socket, _)) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await
    else {
        panic!("ws connect failed");
    };

    let followed = Uuid::new_v4();
    let subscribe = json!({
        "id": "sub-1",
        "type": "command",
        "payload": { "command": "subscribe", "user_ids": [followed] }
    });
    let Ok(()) = socket.send(Message::text(subscribe.to_string())).await else {
        panic!("send failed");
    };

    let Some(Ok(ack)) = socket.next().await else {
        panic!("no subscribe ack");
    };
    let Ok(ack) = serde_json::from_str::<Value>(ack.to_text().unwrap_or_default()) else {
        panic!("ack not json");
    };
    assert_eq!(ack["type"], "response");
    assert_eq!(ack["payload"]["count"], 1);

    let client = reqwest::Client::new();
    for user in [Uuid::new_v4(), followed] {
        let Ok(resp) = client
            .post(format!("http://{addr}/api/v1/wallet/deposit"))
            .json(&json!({ "user_id": user, "amount": "50", "method": "bkash", "language": "en" }))
            .send()
            .await
        else {
            panic!("deposit failed");
        };
        assert!(resp.status().is_success());
    }

    let Ok(Some(Ok(event))) = tokio::time::timeout(Duration::from_secs(5), socket.next()).await
    else {
        panic!("no event received");
    };
    let Ok(event) = serde_json::from_str::<Value>(event.to_text().unwrap_or_default()) else {
        panic!("event not json");
    };
    assert_eq!(event["type"], "event");
    assert_eq!(event["payload"]["event_type"], "balance_changed");
    assert_eq!(event["payload"]["user_id"], followed.to_string());
    assert_eq!(event["payload"]["transaction_type"], "deposit");
}
