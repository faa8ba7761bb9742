use crate::ui::buttons::PlayerButton;

/// Comando de texto reconocido tras el prefijo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `None` cuando se usa sin argumentos
    Play(Option<String>),
    Skip,
    Pause,
    Resume,
    Stop,
    Queue,
    NowPlaying,
    Join,
    Leave,
    Help,
}

impl Command {
    /// Parses `content` as a prefixed command. Returns `None` for anything that
    /// is not a known command so ordinary chat is ignored.
    pub fn parse(prefix: &str, content: &str) -> Option<Self> {
        let rest = content.trim_start().strip_prefix(prefix)?;
        let mut parts = rest.trim_start().splitn(2, char::is_whitespace);
        let name = parts.next()?.to_lowercase();
        let args = parts.next().map(str::trim).filter(|a| !a.is_empty());

        let command = match name.as_str() {
            "play" | "p" => Self::Play(args.map(str::to_string)),
            "skip" | "s" => Self::Skip,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "stop" => Self::Stop,
            "queue" | "q" => Self::Queue,
            "nowplaying" | "np" => Self::NowPlaying,
            "join" => Self::Join,
            "leave" => Self::Leave,
            "help" => Self::Help,
            _ => return None,
        };

        Some(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Play(_) => "play",
            Self::Skip => "skip",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Queue => "queue",
            Self::NowPlaying => "nowplaying",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Help => "help",
        }
    }
}

impl From<PlayerButton> for Command {
    fn from(button: PlayerButton) -> Self {
        match button {
            PlayerButton::Pause => Self::Pause,
            PlayerButton::Resume => Self::Resume,
            PlayerButton::Skip => Self::Skip,
            PlayerButton::Stop => Self::Stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_play_with_query() {
        assert_eq!(
            Command::parse("&", "&play never gonna give you up"),
            Some(Command::Play(Some("never gonna give you up".into())))
        );
        assert_eq!(
            Command::parse("&", "&p   https://youtu.be/dQw4w9WgXcQ  "),
            Some(Command::Play(Some("https://youtu.be/dQw4w9WgXcQ".into())))
        );
    }

    #[test]
    fn test_play_without_query() {
        assert_eq!(Command::parse("&", "&play"), Some(Command::Play(None)));
        assert_eq!(Command::parse("&", "&p    "), Some(Command::Play(None)));
    }

    #[test]
    fn test_aliases_and_case() {
        assert_eq!(Command::parse("&", "&s"), Some(Command::Skip));
        assert_eq!(Command::parse("&", "&SKIP"), Some(Command::Skip));
        assert_eq!(Command::parse("&", "&q"), Some(Command::Queue));
        assert_eq!(Command::parse("&", "&np"), Some(Command::NowPlaying));
        assert_eq!(Command::parse("&", "& pause"), Some(Command::Pause));
        assert_eq!(Command::parse("!", "!resume"), Some(Command::Resume));
        assert_eq!(Command::parse("&", "&stop now"), Some(Command::Stop));
    }

    #[test]
    fn test_non_commands_are_ignored() {
        assert_eq!(Command::parse("&", "play something"), None);
        assert_eq!(Command::parse("&", "&dance"), None);
        assert_eq!(Command::parse("&", "&"), None);
        assert_eq!(Command::parse("&", ""), None);
        assert_eq!(Command::parse("!", "&play x"), None);
    }

    #[test]
    fn test_buttons_map_to_commands() {
        assert_eq!(Command::from(PlayerButton::Pause), Command::Pause);
        assert_eq!(Command::from(PlayerButton::Stop).name(), "stop");
    }
}
