//! Playback state machine.
//!
//! `SessionState` is the single authority for everything a presenter can see
//! or change: the loaded lines, scroll position and bound, play flag, speed,
//! bookmarks and speaker aliases. Every user intent maps onto one of the
//! methods below. None of them perform I/O, and none of them fail in a way
//! that leaves the session unusable: bad input is normalized, and refused
//! requests come back as a [`Rejection`] with the state untouched.

mod aliases;
mod bookmark;
mod constants;

use crate::loader::LoadError;
use crate::script::{ScriptLine, Speaker};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use aliases::SpeakerAliases;
pub use bookmark::Bookmark;
pub use constants::*;

/// A request the state machine refused. State is unchanged when returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no script loaded, pick a script first")]
    NothingLoaded,
    #[error("bookmark name must not be empty")]
    EmptyBookmarkName,
    #[error("playback is disabled in preview mode")]
    PreviewActive,
    #[error("start the session before playing")]
    NotStarted,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    lines: Vec<ScriptLine>,
    pub(crate) started: bool,
    pub(crate) playing: bool,
    speed: f64,
    position: f64,
    max_scroll: f64,
    script_source: String,
    bookmarks: Vec<Bookmark>,
    preview_mode: bool,
    error: Option<String>,
    speaker_aliases: SpeakerAliases,
    /// Bookmark target waiting for the first known bound.
    pending_seek: Option<f64>,
    last_bookmark_id: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_SOURCE)
    }
}

impl SessionState {
    pub fn new(script_source: impl Into<String>) -> Self {
        Self {
            lines: Vec::new(),
            started: false,
            playing: false,
            speed: DEFAULT_SPEED,
            position: 0.0,
            max_scroll: 0.0,
            script_source: script_source.into(),
            bookmarks: Vec::new(),
            preview_mode: false,
            error: None,
            speaker_aliases: SpeakerAliases::default(),
            pending_seek: None,
            last_bookmark_id: 0,
        }
    }

    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn max_scroll(&self) -> f64 {
        self.max_scroll
    }

    pub fn script_source(&self) -> &str {
        &self.script_source
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn preview_mode(&self) -> bool {
        self.preview_mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn speaker_aliases(&self) -> &SpeakerAliases {
        &self.speaker_aliases
    }

    pub fn progress(&self) -> f64 {
        crate::progress::progress(self.position, self.max_scroll)
    }

    /// Whether the timing engine should be running right now.
    pub fn should_scroll(&self) -> bool {
        self.started && self.playing && !self.preview_mode
    }

    /// Replace the script with a load result.
    ///
    /// A failed load still leaves something renderable: a single direction
    /// line carrying the error text.
    pub fn load_lines(&mut self, loaded: Result<Vec<ScriptLine>, LoadError>) {
        match loaded {
            Ok(lines) => {
                info!(
                    source = %self.script_source,
                    lines = lines.len(),
                    "Script replaced"
                );
                self.lines = lines;
                self.position = 0.0;
                self.max_scroll = 0.0;
                self.pending_seek = None;
                self.error = None;
            }
            Err(err) => {
                warn!(source = %self.script_source, "Script load failed: {err}");
                self.error = Some(format!("Failed to load script: {err}"));
                self.lines = vec![ScriptLine::direction(format!(
                    "[Error: script could not be loaded - {err}]"
                ))];
            }
        }
    }

    /// Leave the start screen. Playback always begins paused.
    pub fn start(&mut self) -> Result<(), Rejection> {
        if self.lines.is_empty() {
            return Err(Rejection::NothingLoaded);
        }
        self.started = true;
        self.playing = false;
        debug!(lines = self.lines.len(), "Session started");
        Ok(())
    }

    /// Flip play/pause and return the new play flag.
    pub fn toggle_play(&mut self) -> Result<bool, Rejection> {
        let next = !self.playing;
        self.set_playing(next)?;
        Ok(next)
    }

    pub fn set_playing(&mut self, playing: bool) -> Result<(), Rejection> {
        if playing {
            if self.preview_mode {
                return Err(Rejection::PreviewActive);
            }
            if !self.started {
                return Err(Rejection::NotStarted);
            }
        }
        if self.playing != playing {
            debug!(playing, position = self.position, "Play state changed");
        }
        self.playing = playing;
        Ok(())
    }

    pub fn set_speed(&mut self, value: f64) {
        self.speed = clamp_speed(value, self.speed);
        debug!(speed = self.speed, "Speed set");
    }

    pub fn adjust_speed(&mut self, delta: f64) {
        self.set_speed(self.speed + delta);
    }

    pub fn rewind(&mut self) {
        self.position = 0.0;
        self.playing = false;
        self.pending_seek = None;
    }

    /// Append a bookmark at the current position.
    ///
    /// Ids are creation timestamps in milliseconds, bumped past the previous
    /// id when two bookmarks land in the same millisecond.
    pub fn add_bookmark(&mut self, name: &str, now_ms: u64) -> Result<Bookmark, Rejection> {
        if name.trim().is_empty() {
            return Err(Rejection::EmptyBookmarkName);
        }
        let id = now_ms.max(self.last_bookmark_id.saturating_add(1));
        self.last_bookmark_id = id;
        let bookmark = Bookmark {
            id: id.to_string(),
            name: name.to_string(),
            position: self.position,
        };
        self.bookmarks.push(bookmark.clone());
        info!(name, position = self.position, "Bookmark added");
        Ok(bookmark)
    }

    /// Jump to a bookmark and pause.
    ///
    /// Bookmarks outlive script swaps, so the target is clamped to the current
    /// bound. While the bound is still unknown the target is parked and
    /// applied by the next [`update_max_scroll`](Self::update_max_scroll).
    pub fn go_to_bookmark(&mut self, bookmark: &Bookmark) {
        self.playing = false;
        let target = sanitize_distance(bookmark.position);
        if self.max_scroll > 0.0 {
            self.position = target.min(self.max_scroll);
            self.pending_seek = None;
        } else {
            self.position = 0.0;
            self.pending_seek = Some(target).filter(|target| *target > 0.0);
        }
        debug!(
            name = %bookmark.name,
            position = self.position,
            pending = ?self.pending_seek,
            "Jumped to bookmark"
        );
    }

    pub fn set_preview_mode(&mut self, preview: bool) {
        self.preview_mode = preview;
        if preview {
            self.playing = false;
        }
    }

    pub fn set_speaker_alias(&mut self, speaker: Speaker, alias: impl Into<String>) {
        self.speaker_aliases.set(speaker, alias);
    }

    /// Record a freshly measured bound and pull the position back under it.
    pub fn update_max_scroll(&mut self, distance: f64) {
        self.max_scroll = sanitize_distance(distance);
        if self.max_scroll > 0.0 {
            if let Some(target) = self.pending_seek.take() {
                self.position = target;
            }
        }
        self.position = self.position.min(self.max_scroll);
    }

    pub fn set_position(&mut self, distance: f64) {
        self.pending_seek = None;
        self.position = if distance.is_nan() {
            0.0
        } else {
            distance.clamp(0.0, self.max_scroll)
        };
    }

    pub fn set_script_source(&mut self, source: impl Into<String>) {
        self.script_source = source.into();
    }

    /// Stop without the preview and start checks `set_playing` applies.
    pub(crate) fn pause(&mut self) {
        if self.playing {
            debug!(position = self.position, "Playback paused by engine");
        }
        self.playing = false;
    }

    /// Natural end of script: park exactly on the bound and stop.
    pub(crate) fn finish_at_bound(&mut self) {
        self.position = self.max_scroll;
        self.playing = false;
    }

    pub(crate) fn restore_speed(&mut self, speed: f64) {
        self.speed = clamp_speed(speed, DEFAULT_SPEED);
    }

    pub(crate) fn restore_bookmarks(&mut self, bookmarks: Vec<Bookmark>) {
        self.bookmarks = bookmarks
            .into_iter()
            .map(|mut bookmark| {
                bookmark.position = sanitize_distance(bookmark.position);
                bookmark
            })
            .collect();
        self.last_bookmark_id = self
            .bookmarks
            .iter()
            .filter_map(Bookmark::timestamp)
            .max()
            .unwrap_or(0);
    }

    pub(crate) fn restore_aliases(&mut self, aliases: SpeakerAliases) {
        self.speaker_aliases = aliases;
    }
}

fn clamp_speed(value: f64, current: f64) -> f64 {
    if value.is_nan() {
        current
    } else {
        value.clamp(MIN_SPEED, MAX_SPEED)
    }
}

fn sanitize_distance(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
