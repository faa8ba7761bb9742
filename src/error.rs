use serenity::model::id::GuildId;
use thiserror::Error;

/// Errors raised by the media resolver (yt-dlp or a test double).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    #[error("no results for `{0}`")]
    NotFound(String),
    #[error("resolver timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("resolver failed: {0}")]
    Failed(String),
}

/// Errors raised by the voice transport (songbird or a test double).
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors surfaced to callers of the queue manager.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueueError {
    #[error("requester is not connected to a voice channel")]
    NotInVoiceChannel,
    #[error("a queue already exists for guild {0}")]
    AlreadyExists(GuildId),
    #[error("no active queue for guild {0}")]
    NoActiveQueue(GuildId),
    #[error("could not resolve track: {0}")]
    ResolutionFailed(#[source] SourceError),
    #[error("could not open stream: {0}")]
    StreamOpenFailed(#[source] SourceError),
    #[error("voice transport error: {0}")]
    TransportError(#[source] TransportError),
    /// Pause, resume or skip was refused by the player.
    #[error("player control failed: {0}")]
    ControlFailed(#[source] TransportError),
    #[error("queue is full ({0} tracks)")]
    QueueFull(usize),
}

impl From<TransportError> for QueueError {
    fn from(err: TransportError) -> Self {
        QueueError::TransportError(err)
    }
}
