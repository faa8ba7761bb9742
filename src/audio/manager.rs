use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use super::{
    queue::{Phase, QueueSnapshot, Track},
    store::QueueStore,
    transport::{AudioPlayer, PlayerEvent, PlayerEventReceiver, VoiceSession, VoiceTransport},
};
use crate::{
    error::QueueError,
    sources::{MediaResolver, StreamOptions},
};

/// Notifications for the announcer.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    NowPlaying {
        guild_id: GuildId,
        text_channel: ChannelId,
        track: Track,
    },
    PlaybackFailed {
        guild_id: GuildId,
        text_channel: ChannelId,
        track: Track,
        reason: String,
    },
    Finished {
        guild_id: GuildId,
        text_channel: ChannelId,
    },
}

pub type QueueEventSender = mpsc::UnboundedSender<QueueEvent>;
pub type QueueEventReceiver = mpsc::UnboundedReceiver<QueueEvent>;

#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    pub guild_id: GuildId,
    pub requested_by: String,
    pub query: String,
    /// Voice channel the requester is in, if any.
    pub voice_channel: Option<ChannelId>,
    pub text_channel: ChannelId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enqueued {
    pub track: Track,
    /// 1-based; position 1 means the track started playing.
    pub position: usize,
}

/// Per-guild playback queues.
///
/// Every state transition for a guild (commit phase of enqueue, advance,
/// skip, pause, resume, stop and player notifications) runs under that
/// guild's lock. Stream opening happens with the lock released; the queue
/// epoch is re-checked afterwards so a stop in the meantime discards the
/// stream.
pub struct QueueManager<R, T>
where
    R: MediaResolver,
    T: VoiceTransport<Stream = R::Stream>,
{
    resolver: Arc<R>,
    transport: Arc<T>,
    store: QueueStore<T::Session, T::Player>,
    locks: DashMap<GuildId, Arc<Mutex<()>>>,
    events: QueueEventSender,
    next_epoch: AtomicU64,
    max_queue_size: usize,
}

impl<R, T> QueueManager<R, T>
where
    R: MediaResolver,
    T: VoiceTransport<Stream = R::Stream>,
{
    pub fn new(
        resolver: Arc<R>,
        transport: Arc<T>,
        events: QueueEventSender,
        max_queue_size: usize,
    ) -> Self {
        Self {
            resolver,
            transport,
            store: QueueStore::new(),
            locks: DashMap::new(),
            events,
            next_epoch: AtomicU64::new(1),
            max_queue_size,
        }
    }

    /// Resolves `query` and appends it to the guild's queue, creating the
    /// queue (and joining voice) when none exists.
    pub async fn enqueue(self: &Arc<Self>, request: EnqueueRequest) -> Result<Enqueued, QueueError> {
        let guild_id = request.guild_id;
        let voice_channel = request.voice_channel.ok_or(QueueError::NotInVoiceChannel)?;

        let resolved = self.resolver.resolve(&request.query).await.map_err(|e| {
            warn!("🔍 No se pudo resolver '{}': {}", request.query, e);
            QueueError::ResolutionFailed(e)
        })?;
        let track = Track::new(resolved, request.requested_by);

        let guard = self.lock(guild_id).await;

        if let Some(mut queue) = self.store.get_mut(guild_id) {
            if queue.len() >= self.max_queue_size {
                return Err(QueueError::QueueFull(self.max_queue_size));
            }
            queue.pending.push_back(track.clone());
            let position = queue.len();
            info!("➕ Agregado a la cola en guild {} (#{}): {}", guild_id, position, track.title);
            return Ok(Enqueued { track, position });
        }

        let mut session = self.transport.connect(guild_id, voice_channel).await?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let player = session.create_player(events_tx);
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);

        let rejected = match self.store.create(
            guild_id,
            voice_channel,
            request.text_channel,
            session,
            player,
            epoch,
        ) {
            Ok(mut queue) => {
                queue.pending.push_back(track.clone());
                None
            }
            Err(rejected) => Some(rejected),
        };
        if let Some((err, mut session)) = rejected {
            if let Err(e) = session.destroy().await {
                warn!("⚠️ Error al cerrar la sesión de voz en guild {}: {}", guild_id, e);
            }
            return Err(err);
        }
        info!("🎶 Cola creada en guild {} con: {}", guild_id, track.title);

        self.spawn_event_pump(guild_id, epoch, events_rx);
        self.advance(guild_id, epoch, guard).await;

        Ok(Enqueued { track, position: 1 })
    }

    /// Stops the current track; the player's idle notification advances the
    /// queue. Returns the skipped track.
    pub async fn skip(&self, guild_id: GuildId) -> Result<Track, QueueError> {
        let _guard = self.lock(guild_id).await;

        let (player, current) = {
            let mut queue = self
                .store
                .get_mut(guild_id)
                .ok_or(QueueError::NoActiveQueue(guild_id))?;
            let current = queue
                .now_playing()
                .cloned()
                .ok_or(QueueError::NoActiveQueue(guild_id))?;

            if queue.phase == Phase::Loading {
                // Se descarta el stream cuando termine de abrirse
                queue.skip_requested = true;
                info!("⏭️ Skip durante carga en guild {}: {}", guild_id, current.title);
                return Ok(current);
            }
            (queue.player.clone(), current)
        };

        player.stop().map_err(QueueError::ControlFailed)?;
        info!("⏭️ Saltado en guild {}: {}", guild_id, current.title);
        Ok(current)
    }

    pub async fn pause(&self, guild_id: GuildId) -> Result<(), QueueError> {
        self.set_paused(guild_id, true).await
    }

    pub async fn resume(&self, guild_id: GuildId) -> Result<(), QueueError> {
        self.set_paused(guild_id, false).await
    }

    /// Clears the queue and leaves voice. Returns how many tracks were dropped.
    pub async fn stop(&self, guild_id: GuildId) -> Result<usize, QueueError> {
        let _guard = self.lock(guild_id).await;

        let cleared = self
            .store
            .get(guild_id)
            .map(|queue| queue.len())
            .ok_or(QueueError::NoActiveQueue(guild_id))?;

        self.teardown(guild_id).await;
        info!("⏹️ Reproducción detenida en guild {} ({} canciones)", guild_id, cleared);
        Ok(cleared)
    }

    pub fn snapshot(&self, guild_id: GuildId) -> Option<QueueSnapshot> {
        self.store.get(guild_id).map(|queue| queue.snapshot())
    }

    pub fn has_queue(&self, guild_id: GuildId) -> bool {
        self.store.contains(guild_id)
    }

    pub fn active_queues(&self) -> usize {
        self.store.len()
    }

    /// The current track finished: drop it and play the next one.
    ///
    /// `epoch` identifies the session the notification came from; anything
    /// not matching the live queue is ignored.
    pub async fn on_player_idle(&self, guild_id: GuildId, epoch: u64) {
        self.handle_player_event(guild_id, epoch, PlayerEvent::Idle).await;
    }

    /// The current track failed mid-play: report it, then behave like idle.
    pub async fn on_player_error(&self, guild_id: GuildId, epoch: u64, reason: impl Into<String>) {
        self.handle_player_event(guild_id, epoch, PlayerEvent::Error(reason.into()))
            .await;
    }

    async fn lock(&self, guild_id: GuildId) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(self.locks.entry(guild_id).or_default().value());
        lock.lock_owned().await
    }

    fn current_epoch(&self, guild_id: GuildId) -> Option<u64> {
        self.store.get(guild_id).map(|queue| queue.epoch)
    }

    fn emit(&self, event: QueueEvent) {
        if self.events.send(event).is_err() {
            debug!("Sin receptor de eventos de cola");
        }
    }

    fn spawn_event_pump(self: &Arc<Self>, guild_id: GuildId, epoch: u64, mut rx: PlayerEventReceiver) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    PlayerEvent::Idle => manager.on_player_idle(guild_id, epoch).await,
                    PlayerEvent::Error(reason) => {
                        manager.on_player_error(guild_id, epoch, reason).await
                    }
                }
                if manager.current_epoch(guild_id) != Some(epoch) {
                    break;
                }
            }
            debug!("Eventos del reproductor cerrados para guild {} (epoch {})", guild_id, epoch);
        });
    }

    async fn handle_player_event(&self, guild_id: GuildId, epoch: u64, event: PlayerEvent) {
        let guard = self.lock(guild_id).await;

        let (finished, text_channel) = {
            let Some(mut queue) = self.store.get_mut(guild_id) else {
                debug!("Evento {:?} sin cola en guild {}", event, guild_id);
                return;
            };
            if queue.epoch != epoch || queue.phase != Phase::Playing {
                debug!("Evento {:?} obsoleto en guild {}", event, guild_id);
                return;
            }
            let finished = queue.pending.pop_front();
            queue.phase = Phase::Loading;
            queue.paused = false;
            (finished, queue.text_channel)
        };

        if let PlayerEvent::Error(reason) = event {
            error!("❌ Error del reproductor en guild {}: {}", guild_id, reason);
            if let Some(track) = finished {
                self.emit(QueueEvent::PlaybackFailed {
                    guild_id,
                    text_channel,
                    track,
                    reason,
                });
            }
        } else if let Some(track) = finished {
            debug!("Track terminado en guild {}: {}", guild_id, track.title);
        }

        self.advance(guild_id, epoch, guard).await;
    }

    /// Starts the head of the queue, dropping tracks that cannot be played,
    /// or tears the queue down once it is empty. Entered with the guild lock
    /// held; the lock is released only while a stream is being opened.
    async fn advance(&self, guild_id: GuildId, epoch: u64, mut guard: OwnedMutexGuard<()>) {
        loop {
            let head = {
                let Some(mut queue) = self.store.get_mut(guild_id) else {
                    return;
                };
                if queue.epoch != epoch {
                    return;
                }
                let head = queue.pending.front().cloned();
                if head.is_some() {
                    queue.phase = Phase::Loading;
                    queue.skip_requested = false;
                }
                head
            };

            let Some(track) = head else {
                if let Some(text_channel) = self.teardown(guild_id).await {
                    info!("📭 Cola terminada en guild {}", guild_id);
                    self.emit(QueueEvent::Finished {
                        guild_id,
                        text_channel,
                    });
                }
                return;
            };

            drop(guard);
            let opened = self.open_stream(&track).await;
            guard = self.lock(guild_id).await;

            let (player, paused, text_channel) = {
                let Some(mut queue) = self.store.get_mut(guild_id) else {
                    debug!("Cola eliminada durante la carga, stream descartado: {}", track.title);
                    return;
                };
                if queue.epoch != epoch {
                    debug!("Cola reemplazada durante la carga, stream descartado: {}", track.title);
                    return;
                }
                if queue.skip_requested {
                    queue.skip_requested = false;
                    queue.pending.pop_front();
                    continue;
                }
                (queue.player.clone(), queue.paused, queue.text_channel)
            };

            let started = match opened {
                Ok(stream) => player.play(stream).await.map_err(QueueError::from),
                Err(e) => Err(e),
            };

            if let Err(e) = started {
                warn!("⚠️ No se pudo reproducir '{}' en guild {}: {}", track.title, guild_id, e);
                if let Some(mut queue) = self.store.get_mut(guild_id) {
                    queue.pending.pop_front();
                }
                self.emit(QueueEvent::PlaybackFailed {
                    guild_id,
                    text_channel,
                    track,
                    reason: e.to_string(),
                });
                continue;
            }

            if let Some(mut queue) = self.store.get_mut(guild_id) {
                queue.phase = Phase::Playing;
            }
            if paused {
                if let Err(e) = player.pause() {
                    warn!("⚠️ No se pudo aplicar la pausa pendiente: {}", e);
                }
            }

            info!("🎵 Reproduciendo en guild {}: {}", guild_id, track.title);
            self.emit(QueueEvent::NowPlaying {
                guild_id,
                text_channel,
                track,
            });
            return;
        }
    }

    async fn open_stream(&self, track: &Track) -> Result<R::Stream, QueueError> {
        match self
            .resolver
            .open_stream(&track.url, StreamOptions::preferred())
            .await
        {
            Ok(stream) => Ok(stream),
            Err(e) => {
                warn!("🔄 Stream falló para '{}' ({}), reintentando con opciones por defecto", track.title, e);
                self.resolver
                    .open_stream(&track.url, StreamOptions::fallback())
                    .await
                    .map_err(QueueError::StreamOpenFailed)
            }
        }
    }

    /// Removes the queue and destroys its session. Caller holds the guild lock.
    async fn teardown(&self, guild_id: GuildId) -> Option<ChannelId> {
        let mut queue = self.store.remove(guild_id)?;
        queue.pending.clear();

        if let Err(e) = queue.player.stop() {
            debug!("stop al cerrar la cola: {}", e);
        }
        if let Err(e) = queue.session.destroy().await {
            warn!("⚠️ Error al cerrar la sesión de voz en guild {}: {}", guild_id, e);
        }

        Some(queue.text_channel)
    }

    async fn set_paused(&self, guild_id: GuildId, paused: bool) -> Result<(), QueueError> {
        let _guard = self.lock(guild_id).await;

        let (player, phase) = self
            .store
            .get(guild_id)
            .map(|queue| (queue.player.clone(), queue.phase))
            .ok_or(QueueError::NoActiveQueue(guild_id))?;

        // Loading: recorded only, applied once the next track starts.
        if phase == Phase::Playing {
            let applied = if paused { player.pause() } else { player.unpause() };
            applied.map_err(QueueError::ControlFailed)?;
        }

        if let Some(mut queue) = self.store.get_mut(guild_id) {
            queue.paused = paused;
        }

        info!(
            "{} en guild {}",
            if paused { "⏸️ Pausado" } else { "▶️ Reanudado" },
            guild_id
        );
        Ok(())
    }
}
