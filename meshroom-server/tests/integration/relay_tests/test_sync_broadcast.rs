use meshroom_core::{ClientEnvelope, ConnId, ServerEnvelope, SyncKind, SyncPayload};
use serde_json::json;

use crate::integration::{create_test_relay, inbound, init_tracing, join_request};
use crate::utils::drain;

fn payload() -> SyncPayload {
    match json!({"action": "seek", "position": 42.5, "extra": {"nested": true}}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_video_sync_reaches_others_untouched() {
    init_tracing();
    let (tx, mut rx, _output) = create_test_relay();
    let (a, b) = (ConnId::from("a"), ConnId::from("b"));
    tx.send(inbound(&a, join_request("r1"))).await.unwrap();
    tx.send(inbound(&b, join_request("r1"))).await.unwrap();
    drain(&mut rx).await;

    tx.send(inbound(&a, ClientEnvelope::sync(SyncKind::Video, payload())))
        .await
        .unwrap();

    let delivered = drain(&mut rx).await;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].to, b);
    assert_eq!(delivered[0].envelope, ServerEnvelope::Video(payload()));
}

#[tokio::test]
async fn test_chat_from_connection_outside_room_is_dropped() {
    init_tracing();
    let (tx, mut rx, _output) = create_test_relay();
    let (a, b) = (ConnId::from("a"), ConnId::from("b"));
    tx.send(inbound(&a, join_request("r1"))).await.unwrap();
    drain(&mut rx).await;

    tx.send(inbound(&b, ClientEnvelope::sync(SyncKind::Chat, payload())))
        .await
        .unwrap();

    assert!(drain(&mut rx).await.is_empty());
}
