use meshroom_core::{ConnId, MembershipEvent, RoomKey, ServerEnvelope};

use crate::integration::{create_test_relay, inbound, init_tracing, join_request};
use crate::utils::drain;

fn membership(envelope: &ServerEnvelope) -> MembershipEvent {
    match envelope {
        ServerEnvelope::Room(msg) => MembershipEvent::try_from(msg.clone()).unwrap(),
        other => panic!("Expected room frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_first_joiner_gets_empty_peer_list() {
    init_tracing();
    let (tx, mut rx, _output) = create_test_relay();
    let a = ConnId::from("a");

    tx.send(inbound(&a, join_request("r1"))).await.unwrap();

    let delivered = drain(&mut rx).await;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].to, a);
    assert_eq!(
        membership(&delivered[0].envelope),
        MembershipEvent::PeerList {
            room: RoomKey::from("r1"),
            peers: vec![]
        }
    );
}

#[tokio::test]
async fn test_third_joiner_sees_members_in_join_order() {
    init_tracing();
    let (tx, mut rx, output) = create_test_relay();
    let (a, b, c) = (ConnId::from("a"), ConnId::from("b"), ConnId::from("c"));

    for id in [&a, &b, &c] {
        tx.send(inbound(id, join_request("r1"))).await.unwrap();
    }
    drain(&mut rx).await;

    let to_c = output.delivered_to(&c).await;
    assert_eq!(
        membership(&to_c[0]),
        MembershipEvent::PeerList {
            room: RoomKey::from("r1"),
            peers: vec![a.clone(), b.clone()]
        }
    );

    let to_a: Vec<_> = output.delivered_to(&a).await.iter().map(membership).collect();
    assert_eq!(
        to_a,
        vec![
            MembershipEvent::PeerList {
                room: RoomKey::from("r1"),
                peers: vec![]
            },
            MembershipEvent::Join {
                room: RoomKey::from("r1"),
                peer: b.clone()
            },
            MembershipEvent::Join {
                room: RoomKey::from("r1"),
                peer: c.clone()
            },
        ]
    );
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    init_tracing();
    let (tx, mut rx, output) = create_test_relay();
    let (a, b) = (ConnId::from("a"), ConnId::from("b"));

    tx.send(inbound(&a, join_request("r1"))).await.unwrap();
    tx.send(inbound(&b, join_request("r2"))).await.unwrap();
    drain(&mut rx).await;

    assert_eq!(output.delivered_to(&a).await.len(), 1);
    assert_eq!(output.delivered_to(&b).await.len(), 1);
}

#[tokio::test]
async fn test_repeated_join_resends_snapshot_without_announcing() {
    init_tracing();
    let (tx, mut rx, output) = create_test_relay();
    let (a, b) = (ConnId::from("a"), ConnId::from("b"));

    tx.send(inbound(&a, join_request("r1"))).await.unwrap();
    tx.send(inbound(&b, join_request("r1"))).await.unwrap();
    tx.send(inbound(&b, join_request(" r1 "))).await.unwrap();
    drain(&mut rx).await;

    // a: own snapshot and one join for b.
    assert_eq!(output.delivered_to(&a).await.len(), 2);
    let to_b = output.delivered_to(&b).await;
    assert_eq!(to_b.len(), 2);
    assert_eq!(membership(&to_b[0]), membership(&to_b[1]));
}

#[tokio::test]
async fn test_join_without_room_is_dropped() {
    init_tracing();
    let (tx, mut rx, _output) = create_test_relay();
    let a = ConnId::from("a");

    tx.send(inbound(&a, join_request("   "))).await.unwrap();

    assert!(drain(&mut rx).await.is_empty());
}
