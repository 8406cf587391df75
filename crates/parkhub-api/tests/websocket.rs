mod common;

use std::time::Duration;

use futures::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use common::{TestApp, at};
use parkhub_core::types::UserId;

async fn next_json<S>(stream: &mut S) -> Value
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timely frame")
            .expect("open stream")
            .expect("frame");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("json");
        }
    }
}

#[tokio::test]
async fn test_customer_socket_receives_welcome_and_session_opened() {
    let app = TestApp::new(at(9, 0), 1).await;
    app.store.add_vehicle("ABCD12", &UserId::from("bob")).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let router = app.app.clone();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws/notifications/bob"))
        .await
        .expect("connect");

    let welcome = next_json(&mut socket).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["payload"]["userId"], "bob");

    let (status, _) = app
        .send(
            "POST",
            "/api/parking-usages/entry",
            Some(json!({ "entryType": "ocr", "plate": "ABCD12" })),
        )
        .await;
    assert!(status.is_success());

    let opened = next_json(&mut socket).await;
    assert_eq!(opened["type"], "session_opened");
    assert_eq!(opened["payload"]["plate"], "ABCD12");
}

#[tokio::test]
async fn test_admin_socket_receives_gate_events() {
    let app = TestApp::new(at(9, 0), 1).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let router = app.app.clone();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws/admin"))
        .await
        .expect("connect");

    // Registration completes before the upgrade response.
    let (_, stats) = app.send("GET", "/api/ws/stats", None).await;
    assert_eq!(stats["data"]["adminClients"], 1);

    app.send(
        "POST",
        "/api/parking-usages/exit",
        Some(json!({ "exitType": "byId" })),
    )
    .await;

    let rejected = next_json(&mut socket).await;
    assert_eq!(rejected["type"], "exit_rejected");
    assert_eq!(rejected["payload"]["response"]["errorCode"], "SESSION_ID_REQUIRED");
}
