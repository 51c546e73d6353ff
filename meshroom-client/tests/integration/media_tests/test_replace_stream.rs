use meshroom_client::{MediaConstraints, MediaError, MeshError, SignalingState};

use crate::integration::{connected_pair, init_tracing, join, wait_for_op};
use crate::utils::MeshHarness;

#[tokio::test]
async fn test_replace_local_stream_renegotiates() {
    init_tracing();
    let harness = MeshHarness::new();
    let (a, b) = connected_pair(&harness, "a", "b").await;

    b.handle
        .replace_local_stream(MediaConstraints::audio_only())
        .await
        .unwrap();
    assert_eq!(b.capture.calls(), 2);

    wait_for_op(&b, &a.id, "create_offer restart=false", 2).await;
    wait_for_op(&b, &a.id, "set_remote answer", 2).await;
    b.wait_for_state(&a.id, SignalingState::Stable).await;

    let b_to_a = b.factory.connection(&a.id).unwrap();
    assert!(b_to_a.has("remove_track b-audio-1"));
    assert!(b_to_a.has("remove_track b-video-1"));
    assert!(b_to_a.before("remove_track b-audio-1", "add_track b-audio-2"));
    assert!(!b_to_a.has("add_track b-video-2"));

    let streams = b.capture.streams();
    assert!(streams[0].tracks.iter().all(|t| t.is_stopped()));
    assert!(streams[1].tracks.iter().all(|t| !t.is_stopped()));
}

#[tokio::test]
async fn test_replace_reaches_every_peer() {
    init_tracing();
    let harness = MeshHarness::new();
    let (a, b) = connected_pair(&harness, "a", "b").await;

    a.handle
        .replace_local_stream(MediaConstraints::default())
        .await
        .unwrap();

    // a only ever answered; the new tracks force it to offer.
    wait_for_op(&a, &b.id, "add_track a-audio-2", 1).await;
    wait_for_op(&a, &b.id, "create_offer restart=false", 1).await;
    wait_for_op(&a, &b.id, "set_remote answer", 1).await;
    a.wait_for_state(&b.id, SignalingState::Stable).await;
}

#[tokio::test]
async fn test_failed_replace_keeps_current_stream() {
    init_tracing();
    let harness = MeshHarness::new();
    let (a, b) = connected_pair(&harness, "a", "b").await;

    let result = b
        .handle
        .replace_local_stream(MediaConstraints {
            audio: false,
            video: false,
        })
        .await;
    assert!(matches!(
        result,
        Err(MeshError::Media(MediaError::ConstraintsUnsatisfiable(_)))
    ));

    let streams = b.capture.streams();
    assert_eq!(streams.len(), 1);
    assert!(streams[0].tracks.iter().all(|t| !t.is_stopped()));
    assert!(!b.factory.connection(&a.id).unwrap().has("remove_track b-audio-1"));

    // A later member still receives the live tracks.
    let c = harness.peer("c").await;
    join(&c, "r1").await;
    wait_for_op(&b, &c.id, "set_local answer", 1).await;

    let b_to_c = b.factory.connection(&c.id).unwrap();
    assert!(b_to_c.before("add_track b-audio-1", "create_answer"));
    assert!(b_to_c.has("add_track b-video-1"));
}
