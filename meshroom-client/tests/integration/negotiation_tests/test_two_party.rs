use meshroom_client::{NativeEvent, SignalingState};
use meshroom_core::utils::stun_only_ice_config;
use meshroom_core::{CallSignal, ClientEnvelope, ConnId, IceCandidate, SessionDescription};
use std::time::Duration;

use crate::integration::{connected_pair, init_tracing, inject_call, wait_for_op};
use crate::utils::MeshHarness;

fn candidate_frames(envelopes: &[ClientEnvelope]) -> usize {
    envelopes
        .iter()
        .filter(|env| match env {
            ClientEnvelope::Call(call) => matches!(call.signal(), Ok(CallSignal::Candidate(_))),
            _ => false,
        })
        .count()
}

#[tokio::test]
async fn test_joiner_calls_and_existing_member_answers() {
    init_tracing();
    let harness = MeshHarness::new();
    let (a, b) = connected_pair(&harness, "a", "b").await;

    let b_to_a = b.factory.connection(&a.id).unwrap();
    assert_eq!(b_to_a.count("create_offer restart=false"), 1);
    assert!(b_to_a.has("set_remote answer"));
    assert!(b_to_a.before("add_track b-audio-1", "create_offer restart=false"));

    let a_to_b = a.factory.connection(&b.id).unwrap();
    assert_eq!(a_to_b.count("create_offer restart=false"), 0);
    assert!(a_to_b.has("set_remote offer"));
    assert!(a_to_b.before("add_track a-audio-1", "create_answer"));

    assert_eq!(a.handle.peer_ids().await.unwrap(), vec![b.id.clone()]);
    assert_eq!(b.handle.peer_ids().await.unwrap(), vec![a.id.clone()]);
}

#[tokio::test]
async fn test_connections_use_resolved_ice_config() {
    init_tracing();
    let harness = MeshHarness::new();
    let (a, b) = connected_pair(&harness, "a", "b").await;

    assert_eq!(a.factory.ice_seen(), vec![stun_only_ice_config()]);
    assert_eq!(b.factory.ice_seen(), vec![stun_only_ice_config()]);
}

#[tokio::test]
async fn test_local_candidates_trickle_to_remote() {
    init_tracing();
    let harness = MeshHarness::new();
    let (a, b) = connected_pair(&harness, "a", "b").await;

    let b_to_a = b.factory.connection(&a.id).unwrap();
    assert!(b_to_a.emit(NativeEvent::LocalCandidate(Some(IceCandidate::new("candidate:1")))));
    assert!(b_to_a.emit(NativeEvent::LocalCandidate(Some(IceCandidate::new("candidate:2")))));
    assert!(b_to_a.emit(NativeEvent::LocalCandidate(None)));

    wait_for_op(&a, &b.id, "add_candidate candidate:2", 1).await;
    let a_to_b = a.factory.connection(&b.id).unwrap();
    assert!(a_to_b.before("add_candidate candidate:1", "add_candidate candidate:2"));

    // End of gathering stays local.
    assert_eq!(candidate_frames(&b.sink.sent()), 2);
}

#[tokio::test]
async fn test_remote_candidates_wait_for_offer() {
    init_tracing();
    let harness = MeshHarness::new();
    let (a, _b) = connected_pair(&harness, "a", "b").await;
    let late = ConnId::from("z");

    // Candidates outrun the offer; only the offer opens a record.
    inject_call(&a, &late, "r1", CallSignal::Candidate(Some(IceCandidate::new("candidate:9"))));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(a.factory.connection(&late).is_none());

    inject_call(&a, &late, "r1", CallSignal::Offer(SessionDescription::offer("late-offer")));
    inject_call(&a, &late, "r1", CallSignal::Candidate(Some(IceCandidate::new("candidate:10"))));
    a.wait_for_state(&late, SignalingState::Stable).await;
    wait_for_op(&a, &late, "add_candidate candidate:10", 1).await;

    let a_to_late = a.factory.connection(&late).unwrap();
    assert!(!a_to_late.has("add_candidate candidate:9"));
    assert!(a_to_late.before("set_remote offer", "add_candidate candidate:10"));
}

#[tokio::test]
async fn test_foreign_call_frames_are_dropped() {
    init_tracing();
    let harness = MeshHarness::new();
    let (a, b) = connected_pair(&harness, "a", "b").await;
    let ghost = ConnId::from("ghost");

    inject_call(&a, &ghost, "r1", CallSignal::Answer(SessionDescription::answer("stale")));
    inject_call(&a, &ghost, "r9", CallSignal::Offer(SessionDescription::offer("elsewhere")));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(a.handle.peer_ids().await.unwrap(), vec![b.id.clone()]);
    assert_eq!(a.factory.created_for(&ghost), 0);
}

#[tokio::test]
async fn test_stale_answer_is_ignored() {
    init_tracing();
    let harness = MeshHarness::new();
    let (a, b) = connected_pair(&harness, "a", "b").await;

    inject_call(&b, &a.id, "r1", CallSignal::Answer(SessionDescription::answer("late")));
    tokio::time::sleep(Duration::from_millis(50)).await;

    b.wait_for_state(&a.id, SignalingState::Stable).await;
    assert_eq!(b.factory.connection(&a.id).unwrap().count("set_remote answer"), 1);
}
