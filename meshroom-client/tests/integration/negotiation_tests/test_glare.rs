use meshroom_client::SignalingState;
use meshroom_core::{MembershipEvent, RoomKey, ServerEnvelope};

use crate::integration::{init_tracing, join};
use crate::utils::{MeshHarness, wait_until};

#[tokio::test]
async fn test_simultaneous_offers_converge_on_one_negotiation() {
    init_tracing();
    let harness = MeshHarness::new();
    let a = harness.peer("a").await;
    join(&a, "r2").await;

    let c = harness.peer("c").await;
    let d = harness.peer("d").await;
    c.sink.hold_calls();
    d.sink.hold_calls();

    // c offers a, d offers a and c; nothing leaves yet.
    join(&c, "r2").await;
    wait_until("c to call a", || c.sink.held_calls() == 1).await;
    join(&d, "r2").await;
    wait_until("d to call a and c", || d.sink.held_calls() == 2).await;

    // c discovers d as if both had joined at the same instant.
    let snapshot = MembershipEvent::PeerList {
        room: RoomKey::from("r2"),
        peers: vec![a.id.clone(), d.id.clone()],
    };
    c.inbound.send(ServerEnvelope::Room(snapshot.into())).unwrap();
    wait_until("c to call d", || c.sink.held_calls() == 2).await;

    c.sink.release();
    d.sink.release();

    for (peer, remote) in [(&a, &c), (&a, &d), (&c, &a), (&c, &d), (&d, &a), (&d, &c)] {
        peer.wait_for_state(&remote.id, SignalingState::Stable).await;
    }

    // c has the smaller id: it dropped its offer and answered d's.
    let c_to_d = c.factory.connection(&d.id).unwrap();
    assert!(c_to_d.before("set_local offer", "set_local rollback"));
    assert!(c_to_d.before("set_local rollback", "set_remote offer"));
    assert_eq!(c_to_d.count("create_answer"), 1);
    assert!(!c_to_d.has("set_remote answer"));

    // d kept its offer and never answered c's.
    let d_to_c = d.factory.connection(&c.id).unwrap();
    assert_eq!(d_to_c.count("create_offer restart=false"), 1);
    assert!(!d_to_c.has("create_answer"));
    assert!(!d_to_c.has("set_remote offer"));
    assert_eq!(d_to_c.count("set_remote answer"), 1);

    // One record per pair on every side.
    assert_eq!(c.factory.created_for(&d.id), 1);
    assert_eq!(d.factory.created_for(&c.id), 1);
    assert_eq!(a.handle.peer_ids().await.unwrap(), vec![c.id.clone(), d.id.clone()]);
    assert_eq!(a.factory.connection(&c.id).unwrap().count("create_offer restart=false"), 0);
    assert_eq!(a.factory.connection(&d.id).unwrap().count("create_offer restart=false"), 0);
}
