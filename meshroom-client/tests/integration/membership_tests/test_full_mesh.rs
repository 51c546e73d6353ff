use meshroom_client::SignalingState;

use crate::integration::{init_tracing, join};
use crate::utils::MeshHarness;

const FIRST_OFFER: &str = "create_offer restart=false";

#[tokio::test]
async fn test_three_members_form_full_mesh() {
    init_tracing();
    let harness = MeshHarness::new();
    let a = harness.peer("a").await;
    let b = harness.peer("b").await;
    let c = harness.peer("c").await;
    for peer in [&a, &b, &c] {
        join(peer, "r1").await;
    }

    for (peer, remote) in [(&a, &b), (&a, &c), (&b, &a), (&b, &c), (&c, &a), (&c, &b)] {
        peer.wait_for_state(&remote.id, SignalingState::Stable).await;
        assert_eq!(peer.factory.created_for(&remote.id), 1);
    }

    // Only later joiners call.
    assert!(!a.factory.connection(&b.id).unwrap().has(FIRST_OFFER));
    assert!(!a.factory.connection(&c.id).unwrap().has(FIRST_OFFER));
    assert!(!b.factory.connection(&c.id).unwrap().has(FIRST_OFFER));
    assert!(b.factory.connection(&a.id).unwrap().has(FIRST_OFFER));
    assert!(c.factory.connection(&a.id).unwrap().has(FIRST_OFFER));
    assert!(c.factory.connection(&b.id).unwrap().has(FIRST_OFFER));

    assert_eq!(c.handle.peer_ids().await.unwrap(), vec![a.id.clone(), b.id.clone()]);
}

#[tokio::test]
async fn test_rooms_do_not_mix() {
    init_tracing();
    let harness = MeshHarness::new();
    let a = harness.peer("a").await;
    let b = harness.peer("b").await;
    join(&a, "r1").await;
    join(&b, "r2").await;

    let c = harness.peer("c").await;
    join(&c, "r2").await;
    c.wait_for_state(&b.id, SignalingState::Stable).await;

    assert_eq!(c.handle.peer_ids().await.unwrap(), vec![b.id.clone()]);
    assert!(a.handle.peer_ids().await.unwrap().is_empty());
    assert_eq!(a.factory.created_for(&c.id), 0);
}
