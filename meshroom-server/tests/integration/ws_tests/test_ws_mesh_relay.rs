use meshroom_core::{
    CallMessage, CallSignal, ClientEnvelope, MembershipEvent, RoomKey, ServerEnvelope,
    SessionDescription,
};

use crate::integration::{init_tracing, join_request};
use crate::utils::{WsTestClient, spawn_server};

fn membership(envelope: ServerEnvelope) -> MembershipEvent {
    match envelope {
        ServerEnvelope::Room(msg) => MembershipEvent::try_from(msg).expect("Bad room frame"),
        other => panic!("Expected room frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_two_clients_exchange_offer_over_websocket() {
    init_tracing();
    let addr = spawn_server().await.expect("Failed to start server");
    let room = RoomKey::from("lobby");

    let mut alice = WsTestClient::connect(addr).await.expect("alice connect");
    let mut bob = WsTestClient::connect(addr).await.expect("bob connect");
    assert_ne!(alice.conn_id, bob.conn_id);

    alice.send(&join_request("lobby")).await.unwrap();
    assert_eq!(
        membership(alice.recv().await.unwrap()),
        MembershipEvent::PeerList {
            room: room.clone(),
            peers: vec![]
        }
    );

    bob.send(&join_request("lobby")).await.unwrap();
    assert_eq!(
        membership(bob.recv().await.unwrap()),
        MembershipEvent::PeerList {
            room: room.clone(),
            peers: vec![alice.conn_id.clone()]
        }
    );
    assert_eq!(
        membership(alice.recv().await.unwrap()),
        MembershipEvent::Join {
            room: room.clone(),
            peer: bob.conn_id.clone()
        }
    );

    let signal = CallSignal::Offer(SessionDescription::offer("v=0\r\n"));
    bob.send(&ClientEnvelope::Call(CallMessage::new(
        &signal,
        room.clone(),
        Some(alice.conn_id.clone()),
    )))
    .await
    .unwrap();

    match alice.recv().await.unwrap() {
        ServerEnvelope::Call(call) => {
            assert_eq!(call.socket_id.as_ref(), Some(&bob.conn_id));
            assert_eq!(call.signal().unwrap(), signal);
        }
        other => panic!("Expected call frame, got {:?}", other),
    }

    let bob_id = bob.conn_id.clone();
    bob.close().await.unwrap();
    assert_eq!(
        membership(alice.recv().await.unwrap()),
        MembershipEvent::Leave {
            room,
            peer: bob_id
        }
    );
}

#[tokio::test]
async fn test_malformed_frame_gets_error_and_connection_survives() {
    init_tracing();
    let addr = spawn_server().await.expect("Failed to start server");
    let mut client = WsTestClient::connect(addr).await.expect("connect");

    client.send_raw("{\"type\":\"bogus\"}").await.unwrap();
    assert!(matches!(
        client.recv().await.unwrap(),
        ServerEnvelope::Error { .. }
    ));

    client.send(&join_request("r1")).await.unwrap();
    assert!(matches!(client.recv().await.unwrap(), ServerEnvelope::Room(_)));
    assert!(client.is_quiet(100).await);
}
