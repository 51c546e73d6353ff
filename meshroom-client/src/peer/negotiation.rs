use crate::error::MeshError;
use crate::media::MediaTrack;
use crate::peer::{CandidateBuffer, SignalingState};
use crate::transport::{NativeConnection, PeerConnectionState, SignalSink};
use meshroom_core::{
    CallMessage, CallSignal, ClientEnvelope, ConnId, IceCandidate, RoomKey, SessionDescription,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Everything a peer record needs besides its native connection.
#[derive(Clone)]
pub struct PeerParams {
    pub local_id: ConnId,
    pub remote_id: ConnId,
    pub room: Option<RoomKey>,
    pub sink: Arc<dyn SignalSink>,
    pub local_tracks: Vec<Arc<dyn MediaTrack>>,
    pub max_restarts: u32,
}

/// What the owner of the record should do with its disconnect timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityAction {
    Continue,
    StartGrace,
    CancelGrace,
    Evict,
}

/// Offer/answer state machine toward one remote peer.
///
/// Methods are not reentrant: the caller runs them one at a time, in the
/// order the triggering messages arrived. An `Err` that
/// [`MeshError::is_terminal`] means the record must be closed.
pub struct PeerNegotiation {
    local_id: ConnId,
    remote_id: ConnId,
    room: Option<RoomKey>,
    state: SignalingState,
    connection: Arc<dyn NativeConnection>,
    sink: Arc<dyn SignalSink>,
    buffer: CandidateBuffer,
    local_tracks: Vec<Arc<dyn MediaTrack>>,
    attached: HashSet<String>,
    remote_description_set: bool,
    connection_state: PeerConnectionState,
    restart_attempts: u32,
    max_restarts: u32,
    renegotiate_when_stable: bool,
}

impl PeerNegotiation {
    pub fn new(params: PeerParams, connection: Arc<dyn NativeConnection>) -> Self {
        Self {
            local_id: params.local_id,
            remote_id: params.remote_id,
            room: params.room,
            state: SignalingState::Idle,
            connection,
            sink: params.sink,
            buffer: CandidateBuffer::new(),
            local_tracks: params.local_tracks,
            attached: HashSet::new(),
            remote_description_set: false,
            connection_state: PeerConnectionState::New,
            restart_attempts: 0,
            max_restarts: params.max_restarts,
            renegotiate_when_stable: false,
        }
    }

    pub fn state(&self) -> SignalingState {
        self.state
    }

    pub fn remote_id(&self) -> &ConnId {
        &self.remote_id
    }

    pub fn restart_attempts(&self) -> u32 {
        self.restart_attempts
    }

    pub fn buffered_candidates(&self) -> usize {
        self.buffer.len()
    }

    pub async fn make_call(&mut self) -> Result<(), MeshError> {
        self.require_room()?;
        if self.state != SignalingState::Idle {
            return Err(MeshError::Precondition(format!(
                "cannot call {} from {}",
                self.remote_id, self.state
            )));
        }

        info!(peer = %self.remote_id, "Calling peer");
        self.attach_pending_tracks().await?;
        self.send_offer(false).await
    }

    pub async fn handle_offer(&mut self, offer: SessionDescription) -> Result<(), MeshError> {
        match self.state {
            SignalingState::Closed => {
                debug!(peer = %self.remote_id, "Ignoring offer for closed record");
                return Ok(());
            }
            SignalingState::HaveLocalOffer if self.local_id > self.remote_id => {
                info!(peer = %self.remote_id, "Glare: keeping local offer");
                return Ok(());
            }
            SignalingState::HaveLocalOffer => {
                info!(peer = %self.remote_id, "Glare: rolling back local offer");
                self.connection
                    .set_local_description(SessionDescription::rollback())
                    .await
                    .map_err(|e| self.fail(&e))?;
                self.renegotiate_when_stable = false;
            }
            SignalingState::Idle | SignalingState::Stable | SignalingState::Failed => {}
        }

        self.connection
            .set_remote_description(offer)
            .await
            .map_err(|e| self.fail(&e))?;
        self.remote_description_set = true;
        self.drain_candidates().await;
        self.attach_pending_tracks().await?;

        let answer = self
            .connection
            .create_answer()
            .await
            .map_err(|e| self.fail(&e))?;
        self.connection
            .set_local_description(answer.clone())
            .await
            .map_err(|e| self.fail(&e))?;
        self.state = SignalingState::Stable;
        debug!(peer = %self.remote_id, "Answering offer");
        self.emit(CallSignal::Answer(answer))?;

        self.on_stable().await
    }

    /// Answers outside `have-local-offer` belong to a superseded negotiation.
    pub async fn handle_answer(&mut self, answer: SessionDescription) -> Result<(), MeshError> {
        if self.state != SignalingState::HaveLocalOffer {
            warn!(peer = %self.remote_id, state = %self.state, "Ignoring stale answer");
            return Ok(());
        }

        self.connection
            .set_remote_description(answer)
            .await
            .map_err(|e| self.fail(&e))?;
        self.remote_description_set = true;
        self.drain_candidates().await;
        self.state = SignalingState::Stable;
        debug!(peer = %self.remote_id, "Answer applied");

        self.on_stable().await
    }

    pub async fn handle_candidate(
        &mut self,
        candidate: Option<IceCandidate>,
    ) -> Result<(), MeshError> {
        let Some(candidate) = candidate.filter(|c| !c.is_end_of_candidates()) else {
            debug!(peer = %self.remote_id, "Remote end of candidates");
            return Ok(());
        };
        if self.state == SignalingState::Closed {
            return Ok(());
        }

        if self.remote_description_set {
            self.apply_candidate(candidate).await;
        } else {
            self.buffer.push(candidate);
            debug!(peer = %self.remote_id, queued = self.buffer.len(), "Buffered candidate");
        }
        Ok(())
    }

    /// Trickles a locally gathered candidate to the remote peer.
    pub fn send_local_candidate(&self, candidate: Option<IceCandidate>) -> Result<(), MeshError> {
        let Some(candidate) = candidate else {
            debug!(peer = %self.remote_id, "Local gathering complete");
            return Ok(());
        };
        if self.state == SignalingState::Closed {
            return Ok(());
        }
        self.emit(CallSignal::Candidate(Some(candidate)))
    }

    /// Swaps the outgoing tracks. A stable connection renegotiates at once,
    /// one with an offer in flight does so after the answer.
    pub async fn replace_tracks(
        &mut self,
        tracks: Vec<Arc<dyn MediaTrack>>,
    ) -> Result<(), MeshError> {
        let keep: HashSet<&str> = tracks.iter().map(|track| track.id()).collect();
        let stale: Vec<String> = self
            .attached
            .iter()
            .filter(|id| !keep.contains(id.as_str()))
            .cloned()
            .collect();

        for id in &stale {
            self.connection
                .remove_track(id)
                .await
                .map_err(|e| self.fail(&e))?;
            self.attached.remove(id);
        }

        self.local_tracks = tracks;
        let added = self.attach_pending_tracks().await?;
        if added == 0 && stale.is_empty() {
            return Ok(());
        }

        match self.state {
            SignalingState::Stable => {
                info!(peer = %self.remote_id, "Renegotiating for new local tracks");
                self.send_offer(false).await
            }
            SignalingState::HaveLocalOffer | SignalingState::Failed => {
                self.renegotiate_when_stable = true;
                Ok(())
            }
            // The first offer or answer carries them.
            SignalingState::Idle | SignalingState::Closed => Ok(()),
        }
    }

    pub async fn handle_connection_state(
        &mut self,
        state: PeerConnectionState,
    ) -> Result<ConnectivityAction, MeshError> {
        debug!(peer = %self.remote_id, ?state, "Connection state changed");
        self.connection_state = state;

        match state {
            PeerConnectionState::Connected => {
                if self.restart_attempts > 0 {
                    info!(peer = %self.remote_id, attempts = self.restart_attempts, "Connection recovered");
                }
                self.restart_attempts = 0;
                Ok(ConnectivityAction::CancelGrace)
            }
            PeerConnectionState::Disconnected => Ok(ConnectivityAction::StartGrace),
            PeerConnectionState::Failed => {
                if self.state != SignalingState::Closed {
                    self.state = SignalingState::Failed;
                }
                self.restart_ice().await?;
                Ok(ConnectivityAction::CancelGrace)
            }
            PeerConnectionState::Closed => Ok(ConnectivityAction::Evict),
            PeerConnectionState::New | PeerConnectionState::Connecting => {
                Ok(ConnectivityAction::Continue)
            }
        }
    }

    /// Restarts ICE unless the connection recovered during the grace window.
    pub async fn handle_grace_expired(&mut self) -> Result<(), MeshError> {
        if self.connection_state != PeerConnectionState::Disconnected {
            debug!(peer = %self.remote_id, "Grace expired after recovery");
            return Ok(());
        }
        warn!(peer = %self.remote_id, "Still disconnected after grace period");
        self.restart_ice().await
    }

    pub async fn restart_ice(&mut self) -> Result<(), MeshError> {
        if self.restart_attempts >= self.max_restarts {
            return Err(MeshError::Negotiation {
                peer: self.remote_id.clone(),
                reason: format!("ICE restart limit of {} reached", self.max_restarts),
            });
        }

        self.restart_attempts += 1;
        info!(peer = %self.remote_id, attempt = self.restart_attempts, "Restarting ICE");
        self.send_offer(true).await
    }

    /// Releases the native connection and discards pending candidates.
    pub async fn close(&mut self) {
        if self.state == SignalingState::Closed {
            return;
        }
        self.state = SignalingState::Closed;
        self.buffer.clear();
        if let Err(e) = self.connection.close().await {
            warn!(peer = %self.remote_id, "Failed to close connection: {:#}", e);
        }
        info!(peer = %self.remote_id, "Peer record closed");
    }

    async fn send_offer(&mut self, ice_restart: bool) -> Result<(), MeshError> {
        self.require_room()?;
        let offer = self
            .connection
            .create_offer(ice_restart)
            .await
            .map_err(|e| self.fail(&e))?;
        self.connection
            .set_local_description(offer.clone())
            .await
            .map_err(|e| self.fail(&e))?;
        self.state = SignalingState::HaveLocalOffer;
        self.emit(CallSignal::Offer(offer))
    }

    async fn on_stable(&mut self) -> Result<(), MeshError> {
        if !self.renegotiate_when_stable {
            return Ok(());
        }
        self.renegotiate_when_stable = false;
        self.send_offer(false).await
    }

    async fn attach_pending_tracks(&mut self) -> Result<usize, MeshError> {
        let mut added = 0;
        for track in self.local_tracks.clone() {
            if track.is_stopped() || self.attached.contains(track.id()) {
                continue;
            }
            self.connection
                .add_track(track.clone())
                .await
                .map_err(|e| self.fail(&e))?;
            self.attached.insert(track.id().to_owned());
            added += 1;
        }
        Ok(added)
    }

    async fn drain_candidates(&mut self) {
        for candidate in self.buffer.drain() {
            self.apply_candidate(candidate).await;
        }
    }

    async fn apply_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.connection.add_ice_candidate(candidate).await {
            warn!(peer = %self.remote_id, "Failed to add ICE candidate: {:#}", e);
        }
    }

    fn emit(&self, signal: CallSignal) -> Result<(), MeshError> {
        let room = self.require_room()?;
        let call = CallMessage::new(&signal, room.clone(), Some(self.remote_id.clone()));
        self.sink.send(ClientEnvelope::Call(call))
    }

    fn require_room(&self) -> Result<&RoomKey, MeshError> {
        self.room
            .as_ref()
            .ok_or_else(|| MeshError::Precondition("no room joined".to_owned()))
    }

    fn fail(&self, err: &anyhow::Error) -> MeshError {
        error!(peer = %self.remote_id, state = %self.state, "Negotiation failed: {:#}", err);
        MeshError::negotiation(&self.remote_id, err)
    }
}
