use crate::media::MediaTrack;
use crate::peer::{ConnectivityAction, PeerNegotiation, PeerParams, SignalingState};
use crate::transport::{ConnectionFactory, NativeEvent};
use meshroom_core::{CallSignal, ConnId, IceConfig};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Sleep, sleep};
use tracing::{debug, error, info, warn};

/// Work queued for one peer, processed strictly in submission order.
#[derive(Debug)]
pub enum PeerJob {
    MakeCall,
    Signal(CallSignal),
    ReplaceTracks(Vec<Arc<dyn MediaTrack>>),
    Close,
}

/// Notifications from peer workers to the mesh manager.
#[derive(Debug)]
pub enum PeerEvent {
    RemoteTrack {
        peer: ConnId,
        epoch: u64,
        stream_id: String,
        track: Arc<dyn MediaTrack>,
    },
    /// The worker exited and released its connection.
    Closed { peer: ConnId, epoch: u64 },
}

#[derive(Clone)]
pub struct PeerRuntime {
    pub factory: Arc<dyn ConnectionFactory>,
    pub ice: IceConfig,
    pub disconnect_grace: Duration,
}

/// Manager-side handle of a peer worker.
pub struct PeerHandle {
    epoch: u64,
    jobs: mpsc::UnboundedSender<PeerJob>,
    state: watch::Receiver<SignalingState>,
    closing: watch::Sender<bool>,
}

impl PeerHandle {
    /// Spawns the worker. The native connection is created inside it, so jobs
    /// submitted right away simply wait in the queue.
    pub fn spawn(
        epoch: u64,
        params: PeerParams,
        runtime: PeerRuntime,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SignalingState::Idle);
        let (closing_tx, closing_rx) = watch::channel(false);

        tokio::spawn(run_peer(
            epoch, params, runtime, jobs_rx, closing_rx, state_tx, events,
        ));

        Self {
            epoch,
            jobs: jobs_tx,
            state: state_rx,
            closing: closing_tx,
        }
    }

    pub fn submit(&self, job: PeerJob) -> bool {
        self.jobs.send(job).is_ok()
    }

    /// Marks the record closed. Jobs still queued are discarded unrun.
    pub fn close(&self) {
        self.closing.send_replace(true);
        let _ = self.jobs.send(PeerJob::Close);
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> SignalingState {
        *self.state.borrow()
    }
}

async fn run_peer(
    epoch: u64,
    params: PeerParams,
    runtime: PeerRuntime,
    mut jobs: mpsc::UnboundedReceiver<PeerJob>,
    closing: watch::Receiver<bool>,
    state_tx: watch::Sender<SignalingState>,
    events: mpsc::UnboundedSender<PeerEvent>,
) {
    let peer = params.remote_id.clone();
    let (native_tx, mut native_rx) = mpsc::unbounded_channel();

    let connection = match runtime.factory.create(&peer, &runtime.ice, native_tx).await {
        Ok(connection) => connection,
        Err(e) => {
            error!(%peer, "Failed to create peer connection: {:#}", e);
            state_tx.send_replace(SignalingState::Closed);
            let _ = events.send(PeerEvent::Closed { peer, epoch });
            return;
        }
    };

    debug!(%peer, epoch, "Peer worker started");
    let mut negotiation = PeerNegotiation::new(params, connection);
    let mut grace: Option<Pin<Box<Sleep>>> = None;

    loop {
        let outcome = tokio::select! {
            biased;

            job = jobs.recv() => match job {
                None | Some(PeerJob::Close) => break,
                Some(job) if *closing.borrow() => {
                    debug!(%peer, ?job, "Discarding job for closed peer");
                    break;
                }
                Some(PeerJob::MakeCall) => negotiation.make_call().await,
                Some(PeerJob::Signal(CallSignal::Offer(offer))) => negotiation.handle_offer(offer).await,
                Some(PeerJob::Signal(CallSignal::Answer(answer))) => negotiation.handle_answer(answer).await,
                Some(PeerJob::Signal(CallSignal::Candidate(candidate))) => {
                    negotiation.handle_candidate(candidate).await
                }
                Some(PeerJob::ReplaceTracks(tracks)) => negotiation.replace_tracks(tracks).await,
            },

            Some(event) = native_rx.recv() => match event {
                NativeEvent::LocalCandidate(candidate) => negotiation.send_local_candidate(candidate),
                NativeEvent::RemoteTrack { stream_id, track } => {
                    let _ = events.send(PeerEvent::RemoteTrack {
                        peer: peer.clone(),
                        epoch,
                        stream_id,
                        track,
                    });
                    Ok(())
                }
                NativeEvent::ConnectionState(state) => {
                    match negotiation.handle_connection_state(state).await {
                        Ok(ConnectivityAction::StartGrace) => {
                            if grace.is_none() {
                                debug!(%peer, grace = ?runtime.disconnect_grace, "Starting disconnect grace");
                                grace = Some(Box::pin(sleep(runtime.disconnect_grace)));
                            }
                            Ok(())
                        }
                        Ok(ConnectivityAction::CancelGrace) => {
                            grace = None;
                            Ok(())
                        }
                        Ok(ConnectivityAction::Evict) => {
                            info!(%peer, "Connection closed natively");
                            break;
                        }
                        Ok(ConnectivityAction::Continue) => Ok(()),
                        Err(e) => Err(e),
                    }
                }
            },

            () = grace_elapsed(&mut grace) => {
                grace = None;
                negotiation.handle_grace_expired().await
            }
        };

        state_tx.send_replace(negotiation.state());

        match outcome {
            Ok(()) => {}
            Err(e) if e.is_terminal() => {
                error!(%peer, "Tearing down peer: {}", e);
                break;
            }
            Err(e) => warn!(%peer, "{}", e),
        }
    }

    negotiation.close().await;
    // Dropping the receiver discards callbacks still in flight.
    drop(native_rx);
    state_tx.send_replace(SignalingState::Closed);
    let _ = events.send(PeerEvent::Closed { peer, epoch });
}

async fn grace_elapsed(grace: &mut Option<Pin<Box<Sleep>>>) {
    match grace {
        Some(timer) => timer.as_mut().await,
        None => std::future::pending().await,
    }
}
