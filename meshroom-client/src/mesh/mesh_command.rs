use crate::error::MeshError;
use crate::media::MediaConstraints;
use crate::mesh::RenderSink;
use crate::peer::SignalingState;
use meshroom_core::{ConnId, RoomKey, SyncKind, SyncPayload};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

type Reply<T> = oneshot::Sender<T>;

pub enum MeshCommand {
    JoinRoom {
        room: RoomKey,
        constraints: MediaConstraints,
        reply: Reply<Result<(), MeshError>>,
    },
    LeaveRoom {
        reply: Reply<Result<(), MeshError>>,
    },
    ReplaceLocalStream {
        constraints: MediaConstraints,
        reply: Reply<Result<(), MeshError>>,
    },
    SendSync {
        kind: SyncKind,
        payload: SyncPayload,
        reply: Reply<Result<(), MeshError>>,
    },
    RegisterSink(Arc<dyn RenderSink>),
    PeerIds(Reply<Vec<ConnId>>),
    PeerState {
        peer: ConnId,
        reply: Reply<Option<SignalingState>>,
    },
    LocalId(Reply<ConnId>),
    Room(Reply<Option<RoomKey>>),
}

/// Cloneable front end of a running [`MeshManager`](crate::MeshManager).
#[derive(Clone)]
pub struct MeshHandle {
    commands: mpsc::Sender<MeshCommand>,
}

impl MeshHandle {
    pub fn new(commands: mpsc::Sender<MeshCommand>) -> Self {
        Self { commands }
    }

    pub async fn join_room(
        &self,
        room: impl Into<RoomKey>,
        constraints: MediaConstraints,
    ) -> Result<(), MeshError> {
        let room = room.into();
        self.request(|reply| MeshCommand::JoinRoom {
            room,
            constraints,
            reply,
        })
        .await?
    }

    pub async fn leave_room(&self) -> Result<(), MeshError> {
        self.request(|reply| MeshCommand::LeaveRoom { reply }).await?
    }

    pub async fn replace_local_stream(
        &self,
        constraints: MediaConstraints,
    ) -> Result<(), MeshError> {
        self.request(|reply| MeshCommand::ReplaceLocalStream { constraints, reply })
            .await?
    }

    pub async fn send_sync(&self, kind: SyncKind, payload: SyncPayload) -> Result<(), MeshError> {
        self.request(|reply| MeshCommand::SendSync {
            kind,
            payload,
            reply,
        })
        .await?
    }

    pub async fn register_sink(&self, sink: Arc<dyn RenderSink>) -> Result<(), MeshError> {
        self.commands
            .send(MeshCommand::RegisterSink(sink))
            .await
            .map_err(|_| MeshError::Stopped)
    }

    pub async fn peer_ids(&self) -> Result<Vec<ConnId>, MeshError> {
        self.request(MeshCommand::PeerIds).await
    }

    pub async fn peer_state(&self, peer: &ConnId) -> Result<Option<SignalingState>, MeshError> {
        let peer = peer.clone();
        self.request(|reply| MeshCommand::PeerState { peer, reply })
            .await
    }

    pub async fn local_id(&self) -> Result<ConnId, MeshError> {
        self.request(MeshCommand::LocalId).await
    }

    pub async fn room(&self) -> Result<Option<RoomKey>, MeshError> {
        self.request(MeshCommand::Room).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> MeshCommand,
    ) -> Result<T, MeshError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| MeshError::Stopped)?;
        rx.await.map_err(|_| MeshError::Stopped)
    }
}
