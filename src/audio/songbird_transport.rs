use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    error::JoinError,
    input::Input,
    tracks::{PlayMode, TrackHandle, TrackResult},
    Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::transport::{AudioPlayer, PlayerEvent, PlayerEventSender, VoiceSession, VoiceTransport};
use crate::error::TransportError;

/// [`VoiceTransport`] backed by the songbird instance registered on the
/// serenity client.
pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    volume: f32,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>, volume: f32) -> Self {
        Self { manager, volume }
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    type Stream = Input;
    type Player = SongbirdPlayer;
    type Session = SongbirdSession;

    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<SongbirdSession, TransportError> {
        let call = self
            .manager
            .join(guild_id, channel_id)
            .await
            .map_err(|e| TransportError::new(format!("join failed: {}", e)))?;

        info!("🔊 Conectado al canal de voz {} en guild {}", channel_id, guild_id);

        Ok(SongbirdSession {
            guild_id,
            manager: self.manager.clone(),
            call,
            volume: self.volume,
        })
    }
}

pub struct SongbirdSession {
    guild_id: GuildId,
    manager: Arc<Songbird>,
    call: Arc<Mutex<Call>>,
    volume: f32,
}

#[async_trait]
impl VoiceSession for SongbirdSession {
    type Player = SongbirdPlayer;

    fn create_player(&mut self, events: PlayerEventSender) -> SongbirdPlayer {
        SongbirdPlayer {
            call: self.call.clone(),
            events,
            current: Arc::new(SyncMutex::new(None)),
            volume: self.volume,
        }
    }

    async fn destroy(&mut self) -> Result<(), TransportError> {
        match self.manager.remove(self.guild_id).await {
            Ok(()) | Err(JoinError::NoCall) => {
                info!("👋 Desconectado del canal de voz en guild {}", self.guild_id);
                Ok(())
            }
            Err(e) => Err(TransportError::new(format!("leave failed: {}", e))),
        }
    }
}

#[derive(Clone)]
pub struct SongbirdPlayer {
    call: Arc<Mutex<Call>>,
    events: PlayerEventSender,
    current: Arc<SyncMutex<Option<TrackHandle>>>,
    volume: f32,
}

impl SongbirdPlayer {
    fn with_current<F>(&self, action: &str, f: F) -> Result<(), TransportError>
    where
        F: FnOnce(&TrackHandle) -> TrackResult<()>,
    {
        match self.current.lock().as_ref() {
            Some(handle) => {
                f(handle).map_err(|e| TransportError::new(format!("{} failed: {}", action, e)))
            }
            None => {
                debug!("Sin track actual para {}", action);
                Ok(())
            }
        }
    }
}

/// Applies a track tweak that must not abort playback; a refusal is logged.
fn best_effort(action: &str, result: TrackResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("⚠️ {} falló, se continúa la reproducción: {}", action, e);
            false
        }
    }
}

#[async_trait]
impl AudioPlayer for SongbirdPlayer {
    type Stream = Input;

    async fn play(&self, stream: Input) -> Result<(), TransportError> {
        let handle = {
            let mut call = self.call.lock().await;
            call.play_only_input(stream)
        };

        best_effort("set_volume", handle.set_volume(self.volume));

        // End y Error comparten el flag: solo se reporta una vez por track
        let fired = Arc::new(AtomicBool::new(false));
        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(
                    Event::Track(event),
                    TrackEndNotifier {
                        events: self.events.clone(),
                        fired: fired.clone(),
                    },
                )
                .map_err(|e| TransportError::new(format!("could not register track events: {}", e)))?;
        }

        *self.current.lock() = Some(handle);
        Ok(())
    }

    fn pause(&self) -> Result<(), TransportError> {
        self.with_current("pause", |handle| handle.pause())
    }

    fn unpause(&self) -> Result<(), TransportError> {
        self.with_current("unpause", |handle| handle.play())
    }

    fn stop(&self) -> Result<(), TransportError> {
        self.with_current("stop", |handle| handle.stop())
    }
}

/// Forwards the end (or failure) of a songbird track to the queue manager.
struct TrackEndNotifier {
    events: PlayerEventSender,
    fired: Arc<AtomicBool>,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if self.fired.swap(true, Ordering::SeqCst) {
            return None;
        }

        let event = match ctx {
            EventContext::Track(tracks) => tracks
                .iter()
                .find_map(|(state, _)| match &state.playing {
                    PlayMode::Errored(e) => Some(PlayerEvent::Error(format!("{:?}", e))),
                    _ => None,
                })
                .unwrap_or(PlayerEvent::Idle),
            _ => PlayerEvent::Idle,
        };

        if self.events.send(event).is_err() {
            warn!("⚠️ Evento de track descartado: la cola ya no existe");
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songbird::tracks::ControlError;

    #[test]
    fn test_best_effort_reports_refused_tweaks() {
        assert!(best_effort("set_volume", Ok(())));
        assert!(!best_effort("set_volume", Err(ControlError::Finished)));
    }
}
