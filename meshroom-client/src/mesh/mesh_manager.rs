use crate::config::MeshConfig;
use crate::error::MeshError;
use crate::ice::{CachedIceConfig, IceConfigProvider};
use crate::media::{LocalMedia, MediaCapture, MediaConstraints};
use crate::mesh::{MeshCommand, MeshHandle, RemoteStreams, RenderSink};
use crate::peer::{PeerEvent, PeerHandle, PeerJob, PeerParams, PeerRuntime, SignalingState};
use crate::transport::{ConnectionFactory, SignalSink};
use meshroom_core::{
    CallMessage, CallSignal, ClientEnvelope, ConnId, IceConfig, MembershipEvent, RoomEvent,
    RoomKey, RoomMessage, ServerEnvelope, SyncKind, SyncPayload,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 64;

/// Client-side owner of the mesh: the local stream, one peer worker per
/// remote member and the remote stream mapping handed to render sinks.
///
/// A joiner calls every member listed in its peer snapshot; existing members
/// only answer. All state is owned by the [`run`](Self::run) loop.
pub struct MeshManager {
    local_id: ConnId,
    room: Option<RoomKey>,
    config: MeshConfig,
    signal: Arc<dyn SignalSink>,
    factory: Arc<dyn ConnectionFactory>,
    ice: CachedIceConfig,
    ice_config: Option<IceConfig>,
    media: LocalMedia,
    peers: HashMap<ConnId, PeerHandle>,
    remote_streams: RemoteStreams,
    sinks: Vec<Arc<dyn RenderSink>>,
    events_tx: mpsc::UnboundedSender<PeerEvent>,
    events_rx: mpsc::UnboundedReceiver<PeerEvent>,
    next_epoch: u64,
}

impl MeshManager {
    pub fn new(
        local_id: ConnId,
        config: MeshConfig,
        signal: Arc<dyn SignalSink>,
        factory: Arc<dyn ConnectionFactory>,
        capture: Arc<dyn MediaCapture>,
        ice: Arc<dyn IceConfigProvider>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            local_id,
            room: None,
            config,
            signal,
            factory,
            ice: CachedIceConfig::new(ice),
            ice_config: None,
            media: LocalMedia::new(capture),
            peers: HashMap::new(),
            remote_streams: RemoteStreams::new(),
            sinks: Vec::new(),
            events_tx,
            events_rx,
            next_epoch: 0,
        }
    }

    /// Runs the manager on the runtime, fed by `inbound` signaling frames.
    pub fn spawn(self, inbound: mpsc::UnboundedReceiver<ServerEnvelope>) -> MeshHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(self.run(inbound, rx));
        MeshHandle::new(tx)
    }

    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<ServerEnvelope>,
        mut commands: mpsc::Receiver<MeshCommand>,
    ) {
        info!(local_id = %self.local_id, "Mesh manager started");

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        info!("Command channel closed. Shutting down mesh.");
                        break;
                    }
                },

                Some(envelope) = inbound.recv() => self.handle_server_envelope(envelope),

                Some(event) = self.events_rx.recv() => self.handle_peer_event(event),
            }
        }

        self.shutdown();
        info!("Mesh manager stopped");
    }

    async fn handle_command(&mut self, cmd: MeshCommand) {
        match cmd {
            MeshCommand::JoinRoom {
                room,
                constraints,
                reply,
            } => {
                let _ = reply.send(self.join_room(room, constraints).await);
            }
            MeshCommand::LeaveRoom { reply } => {
                let _ = reply.send(self.leave_room());
            }
            MeshCommand::ReplaceLocalStream { constraints, reply } => {
                let _ = reply.send(self.replace_local_stream(constraints).await);
            }
            MeshCommand::SendSync {
                kind,
                payload,
                reply,
            } => {
                let _ = reply.send(self.send_sync(kind, payload));
            }
            MeshCommand::RegisterSink(sink) => self.register_sink(sink),
            MeshCommand::PeerIds(reply) => {
                let _ = reply.send(self.peer_ids());
            }
            MeshCommand::PeerState { peer, reply } => {
                let _ = reply.send(self.peer_state(&peer));
            }
            MeshCommand::LocalId(reply) => {
                let _ = reply.send(self.local_id.clone());
            }
            MeshCommand::Room(reply) => {
                let _ = reply.send(self.room.clone());
            }
        }
    }

    /// Captures the local stream (once per session) and asks the relay to
    /// join `room`. Joining another room leaves the current one first.
    pub async fn join_room(
        &mut self,
        room: RoomKey,
        constraints: MediaConstraints,
    ) -> Result<(), MeshError> {
        if room.is_blank() {
            return Err(MeshError::Precondition("room key is blank".to_owned()));
        }
        if self.room.as_ref() == Some(&room) {
            debug!(%room, "Already in room");
            return Ok(());
        }
        if self.room.is_some() {
            self.leave_room()?;
        }

        self.media.acquire(&constraints).await?;
        self.ice_config = Some(self.ice.resolve().await);

        self.signal.send(ClientEnvelope::Room(RoomMessage::request(
            RoomEvent::Join,
            room.clone(),
        )))?;
        info!(%room, local_id = %self.local_id, "Joining room");
        self.room = Some(room);
        Ok(())
    }

    pub fn leave_room(&mut self) -> Result<(), MeshError> {
        let room = self.room.take().ok_or(MeshError::NotJoined)?;
        info!(%room, peers = self.peers.len(), "Leaving room");

        let sent = self.signal.send(ClientEnvelope::Room(RoomMessage::request(
            RoomEvent::Leave,
            room,
        )));

        for (peer, handle) in self.peers.drain() {
            debug!(%peer, "Closing peer on leave");
            handle.close();
        }
        if self.remote_streams.clear() {
            self.notify_sinks();
        }
        self.media.stop();
        sent
    }

    /// The only recapture path. Every active record gets the new tracks.
    pub async fn replace_local_stream(
        &mut self,
        constraints: MediaConstraints,
    ) -> Result<(), MeshError> {
        let stream = self.media.replace(&constraints).await?;
        info!(stream = %stream.id, peers = self.peers.len(), "Replaced local stream");

        for handle in self.peers.values() {
            handle.submit(PeerJob::ReplaceTracks(stream.tracks.clone()));
        }
        Ok(())
    }

    pub fn send_sync(&self, kind: SyncKind, payload: SyncPayload) -> Result<(), MeshError> {
        if self.room.is_none() {
            return Err(MeshError::NotJoined);
        }
        self.signal.send(ClientEnvelope::sync(kind, payload))
    }

    /// Registers an observer and immediately hands it the current mapping.
    pub fn register_sink(&mut self, sink: Arc<dyn RenderSink>) {
        sink.render(self.remote_streams.as_map());
        self.sinks.push(sink);
    }

    pub fn peer_ids(&self) -> Vec<ConnId> {
        let mut ids: Vec<_> = self.peers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn peer_state(&self, peer: &ConnId) -> Option<SignalingState> {
        self.peers.get(peer).map(PeerHandle::state)
    }

    pub fn local_id(&self) -> &ConnId {
        &self.local_id
    }

    pub fn room(&self) -> Option<&RoomKey> {
        self.room.as_ref()
    }

    pub fn handle_server_envelope(&mut self, envelope: ServerEnvelope) {
        match envelope {
            ServerEnvelope::Welcome { socket_id } => {
                if socket_id != self.local_id {
                    info!(old = %self.local_id, new = %socket_id, "Relay assigned a new identifier");
                    self.local_id = socket_id;
                }
            }
            ServerEnvelope::Room(msg) => match MembershipEvent::try_from(msg) {
                Ok(event) => self.handle_membership(event),
                Err(e) => warn!("Dropping malformed room frame: {}", e),
            },
            ServerEnvelope::Call(call) => self.handle_call(call),
            ServerEnvelope::Video(payload) => self.dispatch_sync(SyncKind::Video, &payload),
            ServerEnvelope::Chat(payload) => self.dispatch_sync(SyncKind::Chat, &payload),
            ServerEnvelope::Error { message } => warn!("Relay rejected a frame: {}", message),
        }
    }

    fn handle_membership(&mut self, event: MembershipEvent) {
        if self.room.as_ref() != Some(event.room()) {
            warn!(room = %event.room(), "Dropping membership event for another room");
            return;
        }

        match event {
            MembershipEvent::PeerList { peers, .. } => {
                info!(count = peers.len(), "Received peer snapshot");
                let local_id = self.local_id.clone();
                for peer in peers.into_iter().filter(|peer| peer != &local_id) {
                    if self.peers.contains_key(&peer) {
                        continue;
                    }
                    if let Some(handle) = self.ensure_peer(&peer) {
                        handle.submit(PeerJob::MakeCall);
                    }
                }
            }
            // The joiner calls us; nothing to do until its offer arrives.
            MembershipEvent::Join { peer, .. } => info!(%peer, "Peer joined"),
            MembershipEvent::Leave { peer, .. } => {
                info!(%peer, "Peer left");
                self.evict(&peer);
            }
        }
    }

    fn handle_call(&mut self, call: CallMessage) {
        let Some(from) = call.socket_id.clone() else {
            warn!(event = ?call.event, "Dropping call message without sender");
            return;
        };
        if self.room.is_none() || call.room() != self.room.as_ref() {
            warn!(%from, "Dropping call message for another room");
            return;
        }
        if let Some(target) = &call.target_socket_id {
            if target != &self.local_id {
                debug!(%from, %target, "Dropping call message addressed to another peer");
                return;
            }
        }

        let signal = match call.signal() {
            Ok(signal) => signal,
            Err(e) => {
                warn!(%from, "Dropping undecodable call message: {}", e);
                return;
            }
        };

        // Only an offer may open a record.
        let handle = match &signal {
            CallSignal::Offer(_) => self.ensure_peer(&from),
            _ => self.peers.get(&from),
        };
        match handle {
            Some(handle) => {
                handle.submit(PeerJob::Signal(signal));
            }
            None => warn!(%from, event = ?call.event, "Dropping call message for peer without record"),
        }
    }

    fn handle_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::RemoteTrack {
                peer,
                epoch,
                stream_id,
                track,
            } => {
                if self.peers.get(&peer).map(PeerHandle::epoch) != Some(epoch) {
                    debug!(%peer, epoch, "Ignoring track from evicted peer");
                    return;
                }
                debug!(%peer, %stream_id, track = track.id(), "Remote track");
                if self.remote_streams.attach(&peer, &stream_id, track) {
                    self.notify_sinks();
                }
            }
            PeerEvent::Closed { peer, epoch } => {
                let current = self.peers.get(&peer).map(PeerHandle::epoch);
                if current != Some(epoch) {
                    return;
                }
                info!(%peer, "Peer record evicted");
                self.peers.remove(&peer);
                if self.remote_streams.remove(&peer) {
                    self.notify_sinks();
                }
            }
        }
    }

    fn ensure_peer(&mut self, peer: &ConnId) -> Option<&PeerHandle> {
        if !self.peers.contains_key(peer) {
            let (Some(room), Some(ice)) = (self.room.clone(), self.ice_config.clone()) else {
                warn!(%peer, "Not creating peer record outside a room");
                return None;
            };

            self.next_epoch += 1;
            let params = PeerParams {
                local_id: self.local_id.clone(),
                remote_id: peer.clone(),
                room: Some(room),
                sink: self.signal.clone(),
                local_tracks: self.media.tracks(),
                max_restarts: self.config.max_ice_restarts,
            };
            let runtime = PeerRuntime {
                factory: self.factory.clone(),
                ice,
                disconnect_grace: self.config.disconnect_grace,
            };
            let handle = PeerHandle::spawn(self.next_epoch, params, runtime, self.events_tx.clone());
            debug!(%peer, epoch = self.next_epoch, "Created peer record");
            self.peers.insert(peer.clone(), handle);
        }
        self.peers.get(peer)
    }

    /// Leave for an unknown peer is a no-op.
    fn evict(&mut self, peer: &ConnId) {
        if let Some(handle) = self.peers.remove(peer) {
            handle.close();
        }
        if self.remote_streams.remove(peer) {
            self.notify_sinks();
        }
    }

    fn dispatch_sync(&self, kind: SyncKind, payload: &SyncPayload) {
        for sink in &self.sinks {
            sink.sync(kind, payload);
        }
    }

    fn notify_sinks(&self) {
        for sink in &self.sinks {
            sink.render(self.remote_streams.as_map());
        }
    }

    fn shutdown(&mut self) {
        for (_, handle) in self.peers.drain() {
            handle.close();
        }
        self.media.stop();
    }
}
