//! Voice transport seam.
//!
//! The queue manager never talks to songbird directly: it connects through a
//! [`VoiceTransport`], receives a [`VoiceSession`] that it owns for the
//! queue's lifetime, and drives an [`AudioPlayer`] created from that session.
//! Idle and error notifications come back as [`PlayerEvent`] messages on the
//! channel handed to [`VoiceSession::create_player`].

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Notification emitted by a player when the current resource ends.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The resource finished or was stopped.
    Idle,
    /// The resource failed while playing.
    Error(String),
}

pub type PlayerEventSender = mpsc::UnboundedSender<PlayerEvent>;
pub type PlayerEventReceiver = mpsc::UnboundedReceiver<PlayerEvent>;

#[async_trait]
pub trait VoiceTransport: Send + Sync + 'static {
    type Stream: Send + 'static;
    type Player: AudioPlayer<Stream = Self::Stream>;
    type Session: VoiceSession<Player = Self::Player>;

    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Self::Session, TransportError>;
}

#[async_trait]
pub trait VoiceSession: Send + Sync + 'static {
    type Player;

    /// Creates the player bound to this session. Every resource played by it
    /// reports exactly one `Idle` or `Error` on `events`.
    fn create_player(&mut self, events: PlayerEventSender) -> Self::Player;

    async fn destroy(&mut self) -> Result<(), TransportError>;
}

/// Playback primitive. Clones control the same underlying player.
#[async_trait]
pub trait AudioPlayer: Clone + Send + Sync + 'static {
    type Stream: Send + 'static;

    async fn play(&self, stream: Self::Stream) -> Result<(), TransportError>;

    fn pause(&self) -> Result<(), TransportError>;

    fn unpause(&self) -> Result<(), TransportError>;

    fn stop(&self) -> Result<(), TransportError>;
}
