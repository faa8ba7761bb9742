use serenity::{
    all::ButtonStyle,
    builder::{CreateActionRow, CreateButton},
};

/// IDs personalizados para los botones
pub mod button_ids {
    pub const PAUSE: &str = "pause";
    pub const RESUME: &str = "resume";
    pub const SKIP: &str = "skip";
    pub const STOP: &str = "stop";
}

/// Botón de control presionado en el mensaje "now playing"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerButton {
    Pause,
    Resume,
    Skip,
    Stop,
}

impl PlayerButton {
    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        match custom_id {
            button_ids::PAUSE => Some(Self::Pause),
            button_ids::RESUME => Some(Self::Resume),
            button_ids::SKIP => Some(Self::Skip),
            button_ids::STOP => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn custom_id(self) -> &'static str {
        match self {
            Self::Pause => button_ids::PAUSE,
            Self::Resume => button_ids::RESUME,
            Self::Skip => button_ids::SKIP,
            Self::Stop => button_ids::STOP,
        }
    }
}

/// Crea la fila de controles del reproductor
pub fn create_player_controls() -> Vec<CreateActionRow> {
    let pause_btn = CreateButton::new(button_ids::PAUSE)
        .label("Pausar")
        .emoji('⏸')
        .style(ButtonStyle::Secondary);

    let resume_btn = CreateButton::new(button_ids::RESUME)
        .label("Reanudar")
        .emoji('▶')
        .style(ButtonStyle::Success);

    let skip_btn = CreateButton::new(button_ids::SKIP)
        .label("Saltar")
        .emoji('⏭')
        .style(ButtonStyle::Primary);

    let stop_btn = CreateButton::new(button_ids::STOP)
        .label("Detener")
        .emoji('⏹')
        .style(ButtonStyle::Danger);

    vec![CreateActionRow::Buttons(vec![
        pause_btn, resume_btn, skip_btn, stop_btn,
    ])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_ids_round_trip() {
        for button in [
            PlayerButton::Pause,
            PlayerButton::Resume,
            PlayerButton::Skip,
            PlayerButton::Stop,
        ] {
            assert_eq!(PlayerButton::from_custom_id(button.custom_id()), Some(button));
        }
    }

    #[test]
    fn test_unknown_custom_id() {
        assert_eq!(PlayerButton::from_custom_id("music_play_pause"), None);
        assert_eq!(PlayerButton::from_custom_id(""), None);
        assert_eq!(PlayerButton::from_custom_id("Pause"), None);
    }

    #[test]
    fn test_controls_are_a_single_row() {
        assert_eq!(create_player_controls().len(), 1);
    }
}
