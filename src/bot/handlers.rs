use anyhow::Result;
use serenity::{
    builder::{CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage},
    model::{
        application::ComponentInteraction,
        channel::Message,
        id::{ChannelId, GuildId, UserId},
    },
    prelude::Context,
};
use songbird::error::JoinError;
use tracing::{debug, info};

use super::{commands::Command, JukeboxBot};
use crate::{
    audio::EnqueueRequest,
    error::QueueError,
    ui::{buttons::PlayerButton, embeds},
};

/// Respuesta de un comando, enviada como mensaje o como respuesta a la interacción
pub enum Reply {
    Text(String),
    Embed(CreateEmbed),
}

impl Reply {
    fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    fn into_message(self) -> CreateMessage {
        match self {
            Self::Text(content) => CreateMessage::new().content(content),
            Self::Embed(embed) => CreateMessage::new().embed(embed),
        }
    }

    fn into_interaction_message(self) -> CreateInteractionResponseMessage {
        let message = CreateInteractionResponseMessage::new();
        match self {
            Self::Text(content) => message.content(content),
            Self::Embed(embed) => message.embed(embed),
        }
    }
}

/// Quién ejecutó el comando y desde dónde
struct Invocation {
    guild_id: GuildId,
    user_id: UserId,
    user_name: String,
    channel_id: ChannelId,
}

/// Maneja comandos de texto con prefijo
pub async fn handle_message(ctx: &Context, msg: &Message, bot: &JukeboxBot) -> Result<()> {
    if msg.author.bot {
        return Ok(());
    }
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };
    let Some(command) = Command::parse(&bot.config.command_prefix, &msg.content) else {
        return Ok(());
    };

    info!(
        "📝 Comando {} usado por {} en guild {}",
        command.name(),
        msg.author.name,
        guild_id
    );

    let invocation = Invocation {
        guild_id,
        user_id: msg.author.id,
        user_name: msg.author.name.clone(),
        channel_id: msg.channel_id,
    };

    let reply = execute(ctx, bot, &invocation, command).await?;
    msg.channel_id
        .send_message(&ctx.http, reply.into_message())
        .await?;

    Ok(())
}

/// Maneja los botones de control del reproductor
pub async fn handle_component(
    ctx: &Context,
    component: &ComponentInteraction,
    bot: &JukeboxBot,
) -> Result<()> {
    let guild_id = component
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("Componente usado fuera de un servidor"))?;

    info!(
        "🔘 Botón {} presionado por {} en guild {}",
        component.data.custom_id, component.user.name, guild_id
    );

    let reply = match PlayerButton::from_custom_id(&component.data.custom_id) {
        Some(button) => {
            let invocation = Invocation {
                guild_id,
                user_id: component.user.id,
                user_name: component.user.name.clone(),
                channel_id: component.channel_id,
            };
            execute(ctx, bot, &invocation, Command::from(button)).await?
        }
        None => Reply::text("❌ Acción no reconocida"),
    };

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(reply.into_interaction_message().ephemeral(true)),
        )
        .await?;

    Ok(())
}

async fn execute(
    ctx: &Context,
    bot: &JukeboxBot,
    invocation: &Invocation,
    command: Command,
) -> Result<Reply> {
    let guild_id = invocation.guild_id;
    let queues = &bot.queues;

    let reply = match command {
        Command::Play(None) => Reply::text(format!(
            "ℹ️ Uso: `{}play <canción o URL>`",
            bot.config.command_prefix
        )),
        Command::Play(Some(query)) => {
            let request = EnqueueRequest {
                guild_id,
                requested_by: invocation.user_name.clone(),
                query,
                voice_channel: user_voice_channel(ctx, guild_id, invocation.user_id),
                text_channel: invocation.channel_id,
            };
            match queues.enqueue(request).await {
                Ok(enqueued) => Reply::text(embeds::enqueued_message(&enqueued)),
                Err(e) => error_reply(e),
            }
        }
        Command::Skip => match queues.skip(guild_id).await {
            Ok(track) => Reply::text(format!("⏭️ Saltado: **{}**", track.title)),
            Err(e) => error_reply(e),
        },
        Command::Pause => match queues.pause(guild_id).await {
            Ok(()) => Reply::text("⏸️ Pausado"),
            Err(e) => error_reply(e),
        },
        Command::Resume => match queues.resume(guild_id).await {
            Ok(()) => Reply::text("▶️ Reanudado"),
            Err(e) => error_reply(e),
        },
        Command::Stop => match queues.stop(guild_id).await {
            Ok(cleared) => Reply::text(format!("⏹️ Detenido, {} canciones eliminadas de la cola", cleared)),
            Err(e) => error_reply(e),
        },
        Command::Queue => match queues.snapshot(guild_id) {
            Some(snapshot) => Reply::Embed(embeds::create_queue_embed(&snapshot)),
            None => error_reply(QueueError::NoActiveQueue(guild_id)),
        },
        Command::NowPlaying => match queues.snapshot(guild_id).as_ref().and_then(|s| s.current()) {
            Some(track) => Reply::Embed(embeds::create_now_playing_embed(track)),
            None => error_reply(QueueError::NoActiveQueue(guild_id)),
        },
        Command::Join => join(ctx, bot, invocation).await?,
        Command::Leave => leave(bot, guild_id).await?,
        Command::Help => Reply::Embed(embeds::create_help_embed(&bot.config.command_prefix)),
    };

    Ok(reply)
}

async fn join(ctx: &Context, bot: &JukeboxBot, invocation: &Invocation) -> Result<Reply> {
    let guild_id = invocation.guild_id;

    if bot.queues.has_queue(guild_id) || bot.songbird.get(guild_id).is_some() {
        return Ok(Reply::text("🔊 Ya estoy conectado a un canal de voz"));
    }

    let Some(channel_id) = user_voice_channel(ctx, guild_id, invocation.user_id) else {
        return Ok(error_reply(QueueError::NotInVoiceChannel));
    };

    match bot.songbird.join(guild_id, channel_id).await {
        Ok(_) => {
            info!("🔊 Conectado al canal de voz {} en guild {}", channel_id, guild_id);
            Ok(Reply::text("🔊 Conectado al canal de voz"))
        }
        Err(e) => Ok(Reply::Embed(embeds::create_error_embed(
            "Error de conexión",
            &format!("No se pudo conectar al canal de voz: {}", e),
        ))),
    }
}

async fn leave(bot: &JukeboxBot, guild_id: GuildId) -> Result<Reply> {
    match bot.queues.stop(guild_id).await {
        Ok(_) | Err(QueueError::NoActiveQueue(_)) => {}
        Err(e) => return Ok(error_reply(e)),
    }

    match bot.songbird.remove(guild_id).await {
        Ok(()) | Err(JoinError::NoCall) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(Reply::text("👋 Desconectado del canal de voz"))
}

fn error_reply(error: QueueError) -> Reply {
    debug!("Comando rechazado: {}", error);
    Reply::Text(embeds::error_message(&error))
}

// Funciones auxiliares

fn user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    let guild = guild_id.to_guild_cached(&ctx.cache)?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
}
