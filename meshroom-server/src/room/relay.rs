use crate::room::relay_command::RelayCommand;
use crate::room::room_registry::{Departure, RoomRegistry};
use crate::signaling::SignalingOutput;
use meshroom_core::{
    CallMessage, ClientEnvelope, ConnId, MembershipEvent, RoomEvent, RoomKey, RoomMessage,
    ServerEnvelope, SyncKind, SyncPayload,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 256;

/// Single-owner event loop over the room registry.
///
/// Every membership change and every forwarded message goes through this
/// loop, so the registry needs no locking. Delivery is fire-and-forget.
pub struct SignalingRelay {
    registry: RoomRegistry,
    command_rx: mpsc::Receiver<RelayCommand>,
    output: Arc<dyn SignalingOutput>,
}

impl SignalingRelay {
    pub fn new(command_rx: mpsc::Receiver<RelayCommand>, output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            registry: RoomRegistry::new(),
            command_rx,
            output,
        }
    }

    /// Starts the relay loop on the runtime and returns its command sender.
    pub fn spawn(output: Arc<dyn SignalingOutput>) -> mpsc::Sender<RelayCommand> {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(Self::new(rx, output).run());
        tx
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub async fn run(mut self) {
        info!("Signaling relay started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Signaling relay stopped.");
    }

    pub async fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Inbound { conn_id, envelope } => match envelope {
                ClientEnvelope::Room(msg) => self.handle_room_message(conn_id, msg).await,
                ClientEnvelope::Call(call) => self.relay(&conn_id, call).await,
                ClientEnvelope::Video(payload) => {
                    self.broadcast_sync(&conn_id, SyncKind::Video, payload).await
                }
                ClientEnvelope::Chat(payload) => {
                    self.broadcast_sync(&conn_id, SyncKind::Chat, payload).await
                }
            },

            RelayCommand::Disconnect { conn_id } => {
                info!(%conn_id, "Connection closed");
                self.leave(&conn_id).await;
            }
        }
    }

    async fn handle_room_message(&mut self, conn_id: ConnId, msg: RoomMessage) {
        match (msg.event, msg.room().cloned()) {
            (RoomEvent::Join, Some(room)) => self.join(&conn_id, &room).await,
            (RoomEvent::Leave, _) => self.leave(&conn_id).await,
            (RoomEvent::Join, None) => {
                warn!(%conn_id, "Dropping join without room key");
            }
            (RoomEvent::Peers, _) => {
                warn!(%conn_id, "Dropping peers event sent by a client");
            }
        }
    }

    /// Adds `conn_id` to `room`, hands it the member snapshot and tells the
    /// others. Existing members only learn about the joiner; the joiner calls.
    pub async fn join(&mut self, conn_id: &ConnId, room: &RoomKey) {
        let outcome = self.registry.join(conn_id, room);

        if let Some(departure) = outcome.left {
            self.announce_leave(conn_id, departure).await;
        }

        if outcome.newly_joined {
            info!(%conn_id, %room, members = outcome.peers.len() + 1, "Joined room");
            let joined = ServerEnvelope::Room(
                MembershipEvent::Join {
                    room: room.clone(),
                    peer: conn_id.clone(),
                }
                .into(),
            );
            for peer in &outcome.peers {
                self.output.deliver(peer, joined.clone()).await;
            }
        } else {
            debug!(%conn_id, %room, "Repeated join, resending snapshot");
        }

        let peer_list = MembershipEvent::PeerList {
            room: room.clone(),
            peers: outcome.peers,
        };
        self.output
            .deliver(conn_id, ServerEnvelope::Room(peer_list.into()))
            .await;
    }

    pub async fn leave(&mut self, conn_id: &ConnId) {
        match self.registry.leave(conn_id) {
            Some(departure) => self.announce_leave(conn_id, departure).await,
            None => debug!(%conn_id, "Leave for connection outside any room"),
        }
    }

    async fn announce_leave(&self, conn_id: &ConnId, departure: Departure) {
        info!(%conn_id, room = %departure.room, "Left room");
        let left = ServerEnvelope::Room(
            MembershipEvent::Leave {
                room: departure.room,
                peer: conn_id.clone(),
            }
            .into(),
        );
        for peer in &departure.remaining {
            self.output.deliver(peer, left.clone()).await;
        }
    }

    /// Forwards a call message: unicast when it names a target, otherwise to
    /// every other member of the sender's room. The payload is not inspected.
    pub async fn relay(&self, from: &ConnId, call: CallMessage) {
        let Some(sender_room) = self.registry.room_of(from) else {
            warn!(%from, event = ?call.event, "Dropping call message from connection outside any room");
            return;
        };
        let Some(room) = call.room().cloned() else {
            warn!(%from, event = ?call.event, "Dropping call message without room key");
            return;
        };
        if &room != sender_room {
            warn!(%from, %room, joined = %sender_room, "Dropping call message for a room the sender is not in");
            return;
        }

        let target = call.target_socket_id.clone();
        let envelope = ServerEnvelope::Call(call.stamped(from.clone()));

        match target {
            Some(target) if self.registry.is_member(&room, &target) => {
                debug!(%from, %target, "Relaying call message");
                self.output.deliver(&target, envelope).await;
            }
            Some(target) => {
                warn!(%from, %target, %room, "Dropping call message for a target outside the room");
            }
            None => {
                for peer in self.registry.others(&room, from) {
                    self.output.deliver(&peer, envelope.clone()).await;
                }
            }
        }
    }

    async fn broadcast_sync(&self, from: &ConnId, kind: SyncKind, payload: SyncPayload) {
        let Some(room) = self.registry.room_of(from) else {
            warn!(%from, ?kind, "Dropping sync event from connection outside any room");
            return;
        };

        let envelope = ServerEnvelope::sync(kind, payload);
        for peer in self.registry.others(room, from) {
            self.output.deliver(&peer, envelope.clone()).await;
        }
    }
}
