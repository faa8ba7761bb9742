use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};
use std::time::Duration;

use crate::{
    audio::{Enqueued, QueueSnapshot, Track},
    error::{QueueError, SourceError},
};

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎵 Jukebox Bot";

/// Canciones de "a continuación" listadas en el embed de la cola
const QUEUE_PREVIEW_LIMIT: usize = 10;

/// Crea un embed para mostrar la canción actual
pub fn create_now_playing_embed(track: &Track) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("🎵 Reproduciendo Ahora")
        .description(format!("**{}**", track.title))
        .color(colors::SUCCESS_GREEN)
        .field("⏱️ Duración", duration_label(track.duration), true)
        .field("👤 Solicitado por", &track.requested_by, true);

    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }

    embed
        .url(&track.url)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea el embed de la cola: canción actual más las siguientes
pub fn create_queue_embed(snapshot: &QueueSnapshot) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("📋 Cola de Reproducción")
        .color(colors::INFO_BLUE);

    let Some(current) = snapshot.current() else {
        return embed
            .description("😴 **La cola está vacía**")
            .color(colors::NEUTRAL_GRAY)
            .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
            .timestamp(Timestamp::now());
    };

    embed = embed.field(
        format!("{} Reproduciendo", status_icon(snapshot)),
        format!("**{}** · {}", current.title, current.requested_by),
        false,
    );

    let upcoming = upcoming_lines(snapshot, QUEUE_PREVIEW_LIMIT);
    if !upcoming.is_empty() {
        embed = embed.field("⏭️ A continuación", upcoming.join("\n"), false);
    }

    embed
        .field("🔊 Canal", format!("<#{}>", snapshot.voice_channel), true)
        .field("🎶 Canciones", snapshot.tracks.len().to_string(), true)
        .field("⏱️ Duración total", format_duration(snapshot.total_duration()), true)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
        .timestamp(Timestamp::now())
}

pub fn create_help_embed(prefix: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("🎵 Jukebox Bot - Comandos")
        .color(colors::MUSIC_PURPLE)
        .field(
            "🎵 Reproducción",
            format!(
                "• `{p}play <canción o URL>` (`{p}p`) - Agrega a la cola\n\
                • `{p}pause` - Pausa la reproducción\n\
                • `{p}resume` - Reanuda la reproducción\n\
                • `{p}skip` (`{p}s`) - Salta la canción actual\n\
                • `{p}stop` - Detiene y limpia la cola",
                p = prefix
            ),
            false,
        )
        .field(
            "📜 Cola",
            format!(
                "• `{p}queue` (`{p}q`) - Muestra la cola\n\
                • `{p}nowplaying` (`{p}np`) - Muestra la canción actual",
                p = prefix
            ),
            false,
        )
        .field(
            "🔊 Conexión",
            format!(
                "• `{p}join` - Conecta al canal de voz\n\
                • `{p}leave` - Desconecta del canal",
                p = prefix
            ),
            false,
        )
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

pub fn create_error_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("❌ {}", title))
        .description(description)
        .color(colors::ERROR_RED)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Respuesta al comando play
pub fn enqueued_message(enqueued: &Enqueued) -> String {
    if enqueued.position == 1 {
        format!("🎶 Reproduciendo ahora: **{}**", enqueued.track.title)
    } else {
        format!(
            "✅ Agregado a la cola (#{}): **{}**",
            enqueued.position, enqueued.track.title
        )
    }
}

/// Traduce un error de la cola a un mensaje para el usuario
pub fn error_message(error: &QueueError) -> String {
    match error {
        QueueError::NotInVoiceChannel => "🔇 Debes estar en un canal de voz".to_string(),
        QueueError::NoActiveQueue(_) => "📭 No hay nada reproduciéndose".to_string(),
        QueueError::AlreadyExists(_) => "⚠️ Ya hay una cola activa en este servidor".to_string(),
        QueueError::QueueFull(max) => format!("📦 La cola está llena (máximo {} canciones)", max),
        QueueError::ResolutionFailed(SourceError::NotFound(query)) => {
            format!("🔍 No se encontraron resultados para `{}`", query)
        }
        QueueError::ResolutionFailed(SourceError::Timeout(_)) => {
            "⏳ La búsqueda tardó demasiado, intenta de nuevo".to_string()
        }
        QueueError::ResolutionFailed(_) => "❌ No se pudo obtener la canción".to_string(),
        QueueError::StreamOpenFailed(_) => "❌ No se pudo abrir el audio".to_string(),
        QueueError::TransportError(_) => "❌ Error al conectar al canal de voz".to_string(),
        QueueError::ControlFailed(_) => {
            "⚠️ No se pudo controlar la reproducción, intenta de nuevo".to_string()
        }
    }
}

pub fn playback_failed_message(track: &Track) -> String {
    format!("⚠️ No se pudo reproducir **{}**, pasando a la siguiente", track.title)
}

pub fn queue_finished_message() -> &'static str {
    "📭 La cola terminó, desconectando"
}

fn status_icon(snapshot: &QueueSnapshot) -> &'static str {
    if snapshot.loading {
        "⏳"
    } else if snapshot.paused {
        "⏸️"
    } else {
        "▶️"
    }
}

fn upcoming_lines(snapshot: &QueueSnapshot, limit: usize) -> Vec<String> {
    let upcoming = snapshot.up_next();
    let mut lines: Vec<String> = upcoming
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, track)| {
            format!(
                "`{}.` {} [{}]",
                i + 2,
                track.title,
                duration_label(track.duration)
            )
        })
        .collect();

    if upcoming.len() > limit {
        lines.push(format!("… y {} más", upcoming.len() - limit));
    }
    lines
}

fn duration_label(duration: Option<Duration>) -> String {
    match duration {
        Some(duration) => format_duration(duration),
        None => "🔴 En vivo".to_string(),
    }
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::TransportError, sources::ResolvedTrack};
    use pretty_assertions::assert_eq;
    use serenity::model::id::{ChannelId, GuildId};

    fn track(title: &str, secs: Option<u64>) -> Track {
        let mut resolved = ResolvedTrack::new(title, "https://example.com");
        if let Some(secs) = secs {
            resolved = resolved.with_duration(Duration::from_secs(secs));
        }
        Track::new(resolved, "alice")
    }

    fn snapshot(count: usize) -> QueueSnapshot {
        QueueSnapshot {
            tracks: (0..count).map(|i| track(&format!("t{}", i), Some(60))).collect(),
            voice_channel: ChannelId::new(7),
            paused: false,
            loading: false,
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(5)), "0:05");
        assert_eq!(format_duration(Duration::from_secs(245)), "4:05");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1:02:05");
        assert_eq!(duration_label(None), "🔴 En vivo");
    }

    #[test]
    fn test_enqueued_message_depends_on_position() {
        let first = Enqueued {
            track: track("Song", None),
            position: 1,
        };
        let later = Enqueued {
            track: track("Song", None),
            position: 3,
        };

        assert_eq!(enqueued_message(&first), "🎶 Reproduciendo ahora: **Song**");
        assert_eq!(enqueued_message(&later), "✅ Agregado a la cola (#3): **Song**");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            error_message(&QueueError::NotInVoiceChannel),
            "🔇 Debes estar en un canal de voz"
        );
        assert_eq!(
            error_message(&QueueError::NoActiveQueue(GuildId::new(1))),
            "📭 No hay nada reproduciéndose"
        );
        assert_eq!(
            error_message(&QueueError::ResolutionFailed(SourceError::NotFound("xyz".into()))),
            "🔍 No se encontraron resultados para `xyz`"
        );
        assert!(error_message(&QueueError::QueueFull(50)).contains("50"));
    }

    #[test]
    fn test_control_failures_are_not_reported_as_connection_errors() {
        let control = error_message(&QueueError::ControlFailed(TransportError::new(
            "pause failed: track finished",
        )));
        let connect = error_message(&QueueError::TransportError(TransportError::new(
            "missing permissions",
        )));

        assert_eq!(control, "⚠️ No se pudo controlar la reproducción, intenta de nuevo");
        assert_eq!(connect, "❌ Error al conectar al canal de voz");
    }

    #[test]
    fn test_upcoming_lines_are_numbered_after_current() {
        let lines = upcoming_lines(&snapshot(3), 10);
        assert_eq!(lines, vec!["`2.` t1 [1:00]", "`3.` t2 [1:00]"]);
    }

    #[test]
    fn test_upcoming_lines_are_truncated() {
        let lines = upcoming_lines(&snapshot(15), 10);
        assert_eq!(lines.len(), 11);
        assert_eq!(lines.last().map(String::as_str), Some("… y 4 más"));
    }

    #[test]
    fn test_status_icon() {
        let mut snap = snapshot(1);
        assert_eq!(status_icon(&snap), "▶️");
        snap.paused = true;
        assert_eq!(status_icon(&snap), "⏸️");
        snap.loading = true;
        assert_eq!(status_icon(&snap), "⏳");
    }
}
