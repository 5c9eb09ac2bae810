use super::messages::Message;
use super::state::{App, Screen};
use iced::keyboard::{Key, Modifiers, key};
use prompter_core::KeyValueStore;

impl<S: KeyValueStore> App<S> {
    /// Map a key press to the action bound to it on the current screen.
    pub(super) fn shortcut_message_for_key(
        &self,
        key: Key,
        modifiers: Modifiers,
    ) -> Option<Message> {
        let pressed = match key.as_ref() {
            Key::Named(key::Named::Space) => "space".to_string(),
            Key::Named(key::Named::Escape) => "escape".to_string(),
            Key::Named(key::Named::Enter) => "enter".to_string(),
            Key::Named(key::Named::Home) => "home".to_string(),
            Key::Named(key::Named::Tab) => "tab".to_string(),
            Key::Character(ch) => ch.to_ascii_lowercase(),
            _ => return None,
        };

        if self.bookmark_prompt.is_some() {
            return (pressed == "escape").then_some(Message::BookmarkCancelled);
        }

        match self.screen() {
            Screen::Start => None,
            Screen::Preview => {
                if shortcut_matches(&self.config.key_go_home, "h", &pressed, modifiers) {
                    Some(Message::GoHome)
                } else if shortcut_matches(&self.config.key_quit, "q", &pressed, modifiers) {
                    Some(Message::Quit)
                } else {
                    None
                }
            }
            Screen::Player => self.player_shortcut(&pressed, modifiers),
        }
    }

    fn player_shortcut(&self, pressed: &str, modifiers: Modifiers) -> Option<Message> {
        let config = &self.config;
        if shortcut_matches(&config.key_toggle_play_pause, "space", pressed, modifiers) {
            Some(Message::TogglePlayPause)
        } else if shortcut_matches(&config.key_speed_up, "+", pressed, modifiers)
            || shortcut_matches("=", "=", pressed, modifiers)
        {
            Some(Message::SpeedUp)
        } else if shortcut_matches(&config.key_speed_down, "-", pressed, modifiers) {
            Some(Message::SpeedDown)
        } else if shortcut_matches(&config.key_rewind, "r", pressed, modifiers) {
            Some(Message::Rewind)
        } else if shortcut_matches(&config.key_add_bookmark, "b", pressed, modifiers) {
            Some(Message::BookmarkPromptOpened)
        } else if shortcut_matches(&config.key_go_home, "h", pressed, modifiers) {
            Some(Message::GoHome)
        } else if shortcut_matches(&config.key_quit, "q", pressed, modifiers) {
            Some(Message::Quit)
        } else {
            None
        }
    }
}

pub(super) fn shortcut_matches(
    raw: &str,
    fallback: &str,
    pressed: &str,
    modifiers: Modifiers,
) -> bool {
    let normalized = normalize_shortcut_token(raw, fallback);

    let mut required_ctrl = false;
    let mut required_alt = false;
    let mut required_logo = false;
    let mut required_shift = false;
    let mut required_key: Option<&str> = None;

    for token in normalized
        .split('+')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        match token {
            "ctrl" | "control" => required_ctrl = true,
            "alt" => required_alt = true,
            "logo" | "meta" | "super" | "cmd" | "command" => required_logo = true,
            "shift" => required_shift = true,
            key => required_key = Some(key),
        }
    }

    // A binding that is only "+" splits into no tokens at all.
    let required_key = required_key.unwrap_or(if normalized.ends_with('+') {
        "+"
    } else {
        fallback
    });
    if pressed != required_key {
        return false;
    }

    // Shift is already folded into the character on most layouts.
    modifiers.control() == required_ctrl
        && modifiers.alt() == required_alt
        && modifiers.logo() == required_logo
        && (!required_shift || modifiers.shift())
}

pub(super) fn normalize_shortcut_token(raw: &str, fallback: &str) -> String {
    let normalized = raw.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        fallback.to_string()
    } else {
        normalized.replace("spacebar", "space")
    }
}
