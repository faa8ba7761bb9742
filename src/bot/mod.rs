//! # Bot Module
//!
//! Discord-facing side of Jukebox Bot.
//!
//! - [`commands`]: prefix command parsing (`&play`, `&skip`, ...)
//! - [`handlers`]: runs commands and control buttons against the queue
//!   manager and formats the replies
//! - [`events`]: the announcer that posts "now playing", playback failures
//!   and queue completion to the channel each queue was started from
//!
//! [`JukeboxBot`] implements serenity's [`EventHandler`] and holds nothing but
//! shared handles; all playback state lives in the queue manager.

use serenity::{
    all::{ActivityData, ChannelId, Context, EventHandler, Interaction, Message, Ready, VoiceState},
    async_trait,
};
use songbird::Songbird;
use std::sync::Arc;
use tracing::{debug, error, info};

pub mod commands;
pub mod events;
pub mod handlers;

use crate::{audio::MusicQueues, config::Config, error::QueueError};

pub struct JukeboxBot {
    config: Arc<Config>,
    queues: Arc<MusicQueues>,
    songbird: Arc<Songbird>,
}

impl JukeboxBot {
    pub fn new(config: Arc<Config>, queues: Arc<MusicQueues>, songbird: Arc<Songbird>) -> Self {
        Self {
            config,
            queues,
            songbird,
        }
    }
}

#[async_trait]
impl EventHandler for JukeboxBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        ctx.set_activity(Some(ActivityData::listening(format!(
            "{}help",
            self.config.command_prefix
        ))));
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if let Err(e) = handlers::handle_message(&ctx, &msg, self).await {
            error!("Error manejando comando: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            if let Err(e) = handlers::handle_component(&ctx, &component, self).await {
                error!("Error manejando componente: {:?}", e);
            }
        }
    }

    /// Stops the guild's queue when the bot is disconnected from voice by
    /// someone else.
    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let current_user_id = ctx.cache.current_user().id;
        if new.user_id != current_user_id || new.channel_id.is_some() {
            return;
        }
        let (Some(guild_id), Some(left)) = (new.guild_id, old.and_then(|state| state.channel_id))
        else {
            return;
        };

        let queue_channel = self.queues.snapshot(guild_id).map(|queue| queue.voice_channel);
        let still_connected = match self.songbird.get(guild_id) {
            Some(call) => call.lock().await.current_connection().is_some(),
            None => false,
        };
        if !disconnect_ends_queue(left, queue_channel, still_connected) {
            debug!("Desconexión de {} ignorada en guild {}: no es la sesión activa", left, guild_id);
            return;
        }

        info!("🔌 Bot desconectado en guild {}", guild_id);

        match self.queues.stop(guild_id).await {
            Ok(cleared) => info!(
                "🧹 Cola detenida tras desconexión ({} canciones, {} colas activas)",
                cleared,
                self.queues.active_queues()
            ),
            Err(QueueError::NoActiveQueue(_)) => debug!("Sin cola activa en guild {}", guild_id),
            Err(e) => error!("Error al detener reproducción: {:?}", e),
        }
    }
}

/// A "left voice" update only ends the queue it belongs to: the queue must be
/// in the channel that was left and songbird must no longer hold a live
/// connection. A late update for a session that was already replaced fails
/// at least one of the two.
fn disconnect_ends_queue(
    left: ChannelId,
    queue_channel: Option<ChannelId>,
    still_connected: bool,
) -> bool {
    queue_channel == Some(left) && !still_connected
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLD: ChannelId = ChannelId::new(1);
    const NEW: ChannelId = ChannelId::new(2);

    #[test]
    fn test_disconnect_from_live_session_ends_queue() {
        assert!(disconnect_ends_queue(OLD, Some(OLD), false));
    }

    #[test]
    fn test_late_disconnect_does_not_end_newer_queue() {
        // Queue recreated in another channel
        assert!(!disconnect_ends_queue(OLD, Some(NEW), true));
        assert!(!disconnect_ends_queue(OLD, Some(NEW), false));
        // Queue recreated in the same channel, connection already back up
        assert!(!disconnect_ends_queue(OLD, Some(OLD), true));
    }

    #[test]
    fn test_disconnect_without_queue_is_ignored() {
        assert!(!disconnect_ends_queue(OLD, None, false));
    }
}
