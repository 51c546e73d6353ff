use meshroom_client::{MediaConstraints, MediaError, MeshConfig, MeshError, SignalingState};
use std::time::Duration;

use crate::integration::{init_tracing, join};
use crate::utils::{MeshHarness, MockCapture};

#[tokio::test]
async fn test_capture_failure_surfaces_from_join() {
    init_tracing();
    let harness = MeshHarness::new();
    let capture = MockCapture::failing("a", MediaError::PermissionDenied);
    let a = harness.peer_with("a", MeshConfig::default(), capture).await;

    let result = a.handle.join_room("r1", MediaConstraints::default()).await;
    assert!(matches!(
        result,
        Err(MeshError::Media(MediaError::PermissionDenied))
    ));
    assert_eq!(a.handle.room().await.unwrap(), None);

    // The relay never saw a join, so a later member finds the room empty.
    let b = harness.peer("b").await;
    join(&b, "r1").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(b.handle.peer_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_constraints_are_unsatisfiable() {
    init_tracing();
    let harness = MeshHarness::new();
    let a = harness.peer("a").await;

    let none = MediaConstraints {
        audio: false,
        video: false,
    };
    let result = a.handle.join_room("r1", none).await;
    assert!(matches!(
        result,
        Err(MeshError::Media(MediaError::ConstraintsUnsatisfiable(_)))
    ));
    assert_eq!(a.capture.calls(), 0);
}

#[tokio::test]
async fn test_blank_room_is_rejected() {
    init_tracing();
    let harness = MeshHarness::new();
    let a = harness.peer("a").await;

    let result = a.handle.join_room("   ", MediaConstraints::default()).await;
    assert!(matches!(result, Err(MeshError::Precondition(_))));
    assert_eq!(a.capture.calls(), 0);
}

#[tokio::test]
async fn test_one_capture_shared_by_all_peers() {
    init_tracing();
    let harness = MeshHarness::new();
    let a = harness.peer("a").await;
    let b = harness.peer("b").await;
    let c = harness.peer("c").await;
    for peer in [&a, &b, &c] {
        join(peer, "r1").await;
    }
    c.wait_for_state(&a.id, SignalingState::Stable).await;
    c.wait_for_state(&b.id, SignalingState::Stable).await;

    for peer in [&a, &b, &c] {
        assert_eq!(peer.capture.calls(), 1, "{} captured more than once", peer.id);
    }
    for remote in [&a, &b] {
        let connection = c.factory.connection(&remote.id).unwrap();
        assert_eq!(connection.count("add_track c-audio-1"), 1);
        assert_eq!(connection.count("add_track c-video-1"), 1);
    }
}

#[tokio::test]
async fn test_rejoining_same_room_keeps_capture() {
    init_tracing();
    let harness = MeshHarness::new();
    let a = harness.peer("a").await;

    join(&a, "r1").await;
    join(&a, " r1 ").await;

    assert_eq!(a.capture.calls(), 1);
}
