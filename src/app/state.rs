use crate::config::AppConfig;
use iced::widget::scrollable::Id as ScrollId;
use iced::widget::text_input;
use once_cell::sync::Lazy;
use prompter_core::{
    CancellationToken, Extent, FrameToken, Geometry, KeyValueStore, Prompter, SessionState,
};

pub(super) static PLAYER_SCROLL_ID: Lazy<ScrollId> = Lazy::new(|| ScrollId::new("player-scroll"));
pub(super) static BOOKMARK_INPUT_ID: Lazy<text_input::Id> =
    Lazy::new(|| text_input::Id::new("bookmark-name"));

/// Fixed height of the bar under the player and preview.
pub(super) const STATUS_BAR_HEIGHT: f32 = 56.0;

/// Which screen the session state currently maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Screen {
    Start,
    Preview,
    Player,
}

impl Screen {
    pub(super) fn of(state: &SessionState) -> Self {
        if !state.is_started() {
            Screen::Start
        } else if state.preview_mode() {
            Screen::Preview
        } else {
            Screen::Player
        }
    }
}

/// Fixed-pitch layout of the player column: a blank viewport of lead-in, one
/// row per script line, then half a viewport of tail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PlayerLayout {
    pub(super) line_count: usize,
    pub(super) line_height: f64,
    pub(super) viewport_height: f64,
    pub(super) mounted: bool,
}

impl PlayerLayout {
    pub(super) fn new(config: &AppConfig) -> Self {
        Self {
            line_count: 0,
            line_height: config.line_height,
            viewport_height: viewport_for_window(config.window_height),
            mounted: false,
        }
    }

    pub(super) fn extent(&self) -> Extent {
        Extent {
            content_height: self.line_count as f64 * self.line_height
                + self.viewport_height
                + self.tail_height(),
            viewport_height: self.viewport_height,
        }
    }

    pub(super) fn tail_height(&self) -> f64 {
        self.viewport_height / 2.0
    }

    /// Index of the line under the middle of the viewport, if any.
    pub(super) fn focus_line(&self, position: f64) -> Option<usize> {
        let offset = position + self.viewport_height / 2.0 - self.viewport_height;
        if offset < 0.0 || self.line_height <= 0.0 {
            return None;
        }
        let index = (offset / self.line_height).floor() as usize;
        (index < self.line_count).then_some(index)
    }
}

impl Geometry for PlayerLayout {
    fn measure(&self) -> Option<Extent> {
        self.mounted.then(|| self.extent())
    }
}

/// Height left for the player once the status bar is placed.
pub(super) fn viewport_for_window(window_height: f32) -> f64 {
    f64::from((window_height - STATUS_BAR_HEIGHT).max(0.0))
}

/// UI state wrapped around the playback core.
pub struct App<S: KeyValueStore> {
    pub(super) config: AppConfig,
    pub(super) prompter: Prompter<S>,
    pub(super) layout: PlayerLayout,
    pub(super) scheduled: Option<FrameToken>,
    pub(super) scrolled_to: Option<f64>,
    pub(super) status: Option<String>,
    pub(super) load_request_id: u64,
    pub(super) loading: Option<String>,
    pub(super) load_cancel: CancellationToken,
    pub(super) source_input: String,
    pub(super) import_input: String,
    pub(super) bookmark_prompt: Option<String>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(prompter: Prompter<S>, config: AppConfig) -> Self {
        let layout = PlayerLayout::new(&config);
        Self {
            config,
            prompter,
            layout,
            scheduled: None,
            scrolled_to: None,
            status: None,
            load_request_id: 0,
            loading: None,
            load_cancel: CancellationToken::new(),
            source_input: String::new(),
            import_input: String::new(),
            bookmark_prompt: None,
        }
    }

    pub fn frame_pending(&self) -> bool {
        self.scheduled.is_some()
    }

    pub(super) fn screen(&self) -> Screen {
        Screen::of(self.prompter.state())
    }
}
