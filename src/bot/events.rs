use serenity::{builder::CreateMessage, http::Http, model::id::ChannelId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    audio::{QueueEvent, QueueEventReceiver},
    ui::{buttons, embeds},
};

/// Publica en el canal de texto de cada cola lo que el gestor va reproduciendo
pub struct Announcer {
    http: Arc<Http>,
}

impl Announcer {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    /// Consumes queue events until every sender is gone.
    pub fn spawn(self, mut events: QueueEventReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.announce(event).await;
            }
            debug!("Canal de eventos de cola cerrado");
        })
    }

    async fn announce(&self, event: QueueEvent) {
        let (channel_id, message) = render(&event);
        if let Err(e) = channel_id.send_message(&self.http, message).await {
            warn!("⚠️ No se pudo enviar anuncio al canal {}: {:?}", channel_id, e);
        }
    }
}

fn render(event: &QueueEvent) -> (ChannelId, CreateMessage) {
    match event {
        QueueEvent::NowPlaying {
            text_channel,
            track,
            ..
        } => (
            *text_channel,
            CreateMessage::new()
                .embed(embeds::create_now_playing_embed(track))
                .components(buttons::create_player_controls()),
        ),
        QueueEvent::PlaybackFailed { text_channel, .. } | QueueEvent::Finished { text_channel, .. } => (
            *text_channel,
            CreateMessage::new().content(announcement_text(event).unwrap_or_default()),
        ),
    }
}

/// Texto plano del anuncio; `None` para los que se muestran como embed
fn announcement_text(event: &QueueEvent) -> Option<String> {
    match event {
        QueueEvent::NowPlaying { .. } => None,
        QueueEvent::PlaybackFailed { track, .. } => Some(embeds::playback_failed_message(track)),
        QueueEvent::Finished { .. } => Some(embeds::queue_finished_message().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audio::Track, sources::ResolvedTrack};
    use pretty_assertions::assert_eq;
    use serenity::model::id::GuildId;

    fn track() -> Track {
        Track::new(ResolvedTrack::new("Song", "https://example.com/song"), "alice")
    }

    #[test]
    fn test_failed_and_finished_are_plain_text() {
        let failed = QueueEvent::PlaybackFailed {
            guild_id: GuildId::new(1),
            text_channel: ChannelId::new(2),
            track: track(),
            reason: "boom".into(),
        };
        let finished = QueueEvent::Finished {
            guild_id: GuildId::new(1),
            text_channel: ChannelId::new(2),
        };

        assert_eq!(
            announcement_text(&failed).as_deref(),
            Some("⚠️ No se pudo reproducir **Song**, pasando a la siguiente")
        );
        assert_eq!(
            announcement_text(&finished).as_deref(),
            Some("📭 La cola terminó, desconectando")
        );
    }

    #[test]
    fn test_announcements_go_to_queue_channel() {
        let now_playing = QueueEvent::NowPlaying {
            guild_id: GuildId::new(1),
            text_channel: ChannelId::new(42),
            track: track(),
        };

        assert_eq!(announcement_text(&now_playing), None);
        assert_eq!(render(&now_playing).0, ChannelId::new(42));
    }
}
