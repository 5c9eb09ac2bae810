use iced::keyboard::{Key, Modifiers};
use prompter_core::{LoadError, ScriptLine, Speaker};
use std::time::Instant;

/// Messages emitted by the UI.
#[derive(Debug, Clone)]
pub enum Message {
    LoadScript(String),
    SourceInputChanged(String),
    SourceSubmitted,
    ImportPathChanged(String),
    ImportRequested,
    ExportRequested,
    PreviewToggled(bool),
    AliasChanged(Speaker, String),
    SpeedChanged(f64),
    GoToBookmark(String),
    Start,
    TogglePlayPause,
    SpeedUp,
    SpeedDown,
    Rewind,
    GoHome,
    Quit,
    BookmarkPromptOpened,
    BookmarkNameChanged(String),
    BookmarkSubmitted,
    BookmarkCancelled,
    /// The player was scrolled by hand to this offset.
    Scrolled(f64),
    /// The window is about to present a frame.
    Frame(Instant),
    WindowResized {
        height: f32,
    },
    KeyPressed {
        key: Key,
        modifiers: Modifiers,
    },
    ScriptLoaded {
        request_id: u64,
        source: String,
        result: Result<Vec<ScriptLine>, LoadError>,
    },
}
