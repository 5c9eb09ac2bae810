//! Controller hosting the session for a front end.
//!
//! `Prompter` owns the state machine, the timing engine and the settings
//! store. Front ends feed it [`Intent`]s, load results and frame callbacks,
//! and act on the [`Effect`]s it hands back. Persistence is written after the
//! in-memory change and failures are only logged.

use crate::engine::{FrameToken, Geometry, ScrollEngine, TickOutcome};
use crate::loader::LoadError;
use crate::script::{ScriptLine, Speaker, export_script};
use crate::session::{Bookmark, Rejection, SessionState, SpeakerAliases};
use crate::store::{KeyValueStore, StoreKey};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// A user request, one per control or shortcut.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Start,
    TogglePlay,
    SetPlaying(bool),
    SetSpeed(f64),
    AdjustSpeed(f64),
    Rewind,
    AddBookmark(String),
    /// Bookmark id.
    GoToBookmark(String),
    SetPreviewMode(bool),
    SetSpeakerAlias(Speaker, String),
    UpdateMaxScroll(f64),
    SetPosition(f64),
    SetScriptSource(String),
    GoHome,
}

impl Intent {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::TogglePlay => "toggle_play",
            Self::SetPlaying(_) => "set_playing",
            Self::SetSpeed(_) => "set_speed",
            Self::AdjustSpeed(_) => "adjust_speed",
            Self::Rewind => "rewind",
            Self::AddBookmark(_) => "add_bookmark",
            Self::GoToBookmark(_) => "go_to_bookmark",
            Self::SetPreviewMode(_) => "set_preview_mode",
            Self::SetSpeakerAlias(..) => "set_speaker_alias",
            Self::UpdateMaxScroll(_) => "update_max_scroll",
            Self::SetPosition(_) => "set_position",
            Self::SetScriptSource(_) => "set_script_source",
            Self::GoHome => "go_home",
        }
    }
}

/// Something the front end should surface to the presenter.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Rejected(Rejection),
    ScriptLoaded { source: String, lines: usize },
    LoadFailed { source: String, message: String },
    BookmarkAdded { name: String },
    UnknownBookmark { id: String },
    ReachedEnd,
    PlaybackInterrupted,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Rejected(rejection) => write!(f, "{rejection}"),
            Notice::ScriptLoaded { source, lines } => {
                write!(f, "Loaded {lines} lines from {source}")
            }
            Notice::LoadFailed { source, message } => {
                write!(f, "Could not load {source}: {message}")
            }
            Notice::BookmarkAdded { name } => write!(f, "Bookmark \"{name}\" added"),
            Notice::UnknownBookmark { id } => write!(f, "No bookmark with id {id}"),
            Notice::ReachedEnd => write!(f, "End of script"),
            Notice::PlaybackInterrupted => write!(f, "Playback paused, layout unavailable"),
        }
    }
}

/// Work for the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call [`Prompter::on_frame`] with this token on the next display frame.
    ScheduleFrame(FrameToken),
    Notify(Notice),
}

pub struct Prompter<S: KeyValueStore> {
    state: SessionState,
    engine: ScrollEngine,
    store: S,
}

impl<S: KeyValueStore> Prompter<S> {
    /// Build a session and hydrate speed, bookmarks and aliases from `store`.
    /// Each key is restored on its own; a bad value only costs that key.
    pub fn new(store: S, script_source: impl Into<String>) -> Self {
        let mut state = SessionState::new(script_source);
        hydrate(&mut state, &store);
        Self {
            state,
            engine: ScrollEngine::new(),
            store,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.engine.pending()
    }

    pub fn dispatch(&mut self, intent: Intent) -> Vec<Effect> {
        let action = intent.action();
        let mut effects = Vec::new();

        match intent {
            Intent::Start => {
                if let Err(rejection) = self.state.start() {
                    warn!(action, "{rejection}");
                    effects.push(Effect::Notify(Notice::Rejected(rejection)));
                }
            }
            Intent::TogglePlay => {
                if let Err(rejection) = self.state.toggle_play() {
                    effects.push(Effect::Notify(Notice::Rejected(rejection)));
                }
            }
            Intent::SetPlaying(playing) => {
                if let Err(rejection) = self.state.set_playing(playing) {
                    effects.push(Effect::Notify(Notice::Rejected(rejection)));
                }
            }
            Intent::SetSpeed(value) => {
                self.state.set_speed(value);
                self.persist(StoreKey::Speed);
            }
            Intent::AdjustSpeed(delta) => {
                self.state.adjust_speed(delta);
                self.persist(StoreKey::Speed);
            }
            Intent::Rewind => self.state.rewind(),
            Intent::AddBookmark(name) => match self.state.add_bookmark(&name, now_ms()) {
                Ok(bookmark) => {
                    effects.push(Effect::Notify(Notice::BookmarkAdded {
                        name: bookmark.name,
                    }));
                    self.persist(StoreKey::Bookmarks);
                }
                Err(rejection) => effects.push(Effect::Notify(Notice::Rejected(rejection))),
            },
            Intent::GoToBookmark(id) => {
                let found = self.state.bookmarks().iter().find(|b| b.id == id).cloned();
                match found {
                    Some(bookmark) => self.state.go_to_bookmark(&bookmark),
                    None => effects.push(Effect::Notify(Notice::UnknownBookmark { id })),
                }
            }
            Intent::SetPreviewMode(preview) => self.state.set_preview_mode(preview),
            Intent::SetSpeakerAlias(speaker, alias) => {
                self.state.set_speaker_alias(speaker, alias);
                self.persist(StoreKey::SpeakerAliases);
            }
            Intent::UpdateMaxScroll(distance) => self.state.update_max_scroll(distance),
            Intent::SetPosition(distance) => self.state.set_position(distance),
            Intent::SetScriptSource(source) => self.state.set_script_source(source),
            Intent::GoHome => {
                // Leaving the player is a plain field reset rather than a
                // state machine operation.
                self.state.started = false;
                self.state.playing = false;
            }
        }

        debug!(
            action,
            started = self.state.is_started(),
            playing = self.state.is_playing(),
            position = self.state.position(),
            speed = self.state.speed(),
            "Applied intent"
        );
        self.sync_engine(&mut effects);
        effects
    }

    /// Apply the result of loading `source`.
    pub fn apply_load(
        &mut self,
        source: &str,
        loaded: Result<Vec<ScriptLine>, LoadError>,
    ) -> Vec<Effect> {
        self.state.set_script_source(source);
        let notice = match &loaded {
            Ok(lines) => Notice::ScriptLoaded {
                source: source.to_string(),
                lines: lines.len(),
            },
            Err(err) => Notice::LoadFailed {
                source: source.to_string(),
                message: err.to_string(),
            },
        };
        self.state.load_lines(loaded);
        let mut effects = vec![Effect::Notify(notice)];
        self.sync_engine(&mut effects);
        effects
    }

    /// Run one frame of the scroll loop.
    pub fn on_frame(
        &mut self,
        token: FrameToken,
        now: Instant,
        geometry: &dyn Geometry,
    ) -> Vec<Effect> {
        match self.engine.tick(token, now, &mut self.state, geometry) {
            TickOutcome::Advanced { next, .. } => vec![Effect::ScheduleFrame(next)],
            TickOutcome::Finished { .. } => vec![Effect::Notify(Notice::ReachedEnd)],
            TickOutcome::Halted if !self.state.is_playing() && self.state.is_started() => {
                vec![Effect::Notify(Notice::PlaybackInterrupted)]
            }
            TickOutcome::Halted | TickOutcome::Stale => Vec::new(),
        }
    }

    /// Current lines as an exportable script document.
    pub fn export(&self) -> Result<String, serde_json::Error> {
        export_script(self.state.lines())
    }

    fn sync_engine(&mut self, effects: &mut Vec<Effect>) {
        let should_run = self.state.should_scroll();
        if should_run && !self.engine.is_running() {
            effects.push(Effect::ScheduleFrame(self.engine.start()));
        } else if !should_run && self.engine.is_running() {
            self.engine.cancel();
        }
    }

    fn persist(&mut self, key: StoreKey) {
        let value = match key {
            StoreKey::Speed => Ok(self.state.speed().to_string()),
            StoreKey::Bookmarks => serde_json::to_string(self.state.bookmarks()),
            StoreKey::SpeakerAliases => self.state.speaker_aliases().to_json(),
        };
        let result = value
            .map_err(anyhow::Error::from)
            .and_then(|value| self.store.set(key, value));
        if let Err(err) = result {
            warn!(key = key.as_str(), "Failed to persist setting: {err:#}");
        }
    }
}

fn hydrate(state: &mut SessionState, store: &impl KeyValueStore) {
    if let Some(raw) = store.get(StoreKey::Speed) {
        match raw.trim().parse::<f64>() {
            Ok(speed) => state.restore_speed(speed),
            Err(err) => warn!(%raw, "Ignoring stored speed: {err}"),
        }
    }
    if let Some(raw) = store.get(StoreKey::Bookmarks) {
        match serde_json::from_str::<Vec<Bookmark>>(&raw) {
            Ok(bookmarks) => state.restore_bookmarks(bookmarks),
            Err(err) => warn!("Ignoring stored bookmarks: {err}"),
        }
    }
    if let Some(raw) = store.get(StoreKey::SpeakerAliases) {
        match SpeakerAliases::from_json(&raw) {
            Ok(aliases) => state.restore_aliases(aliases),
            Err(err) => warn!("Ignoring stored speaker aliases: {err}"),
        }
    }
    info!(
        speed = state.speed(),
        bookmarks = state.bookmarks().len(),
        "Session hydrated"
    );
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Extent, TRAILING_MARGIN};
    use crate::script::{SpeakerRole, parse_script};
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn three_lines() -> Vec<ScriptLine> {
        vec![
            ScriptLine::direction("(Cold open)"),
            ScriptLine::new(SpeakerRole::SpeakerA, "Andreas: Welcome."),
            ScriptLine::new(SpeakerRole::SpeakerB, "Achim: Let's go."),
        ]
    }

    fn layout_with_bound(max_scroll: f64) -> Extent {
        Extent {
            content_height: max_scroll + 800.0 - TRAILING_MARGIN,
            viewport_height: 800.0,
        }
    }

    fn frame_token(effects: &[Effect]) -> Option<FrameToken> {
        effects.iter().find_map(|effect| match effect {
            Effect::ScheduleFrame(token) => Some(*token),
            _ => None,
        })
    }

    fn loaded_prompter() -> Prompter<MemoryStore> {
        let mut prompter = Prompter::new(MemoryStore::new(), "script.json");
        prompter.apply_load("script.json", Ok(three_lines()));
        prompter
    }

    #[test]
    fn plays_to_the_end_and_stops() {
        let mut prompter = loaded_prompter();
        assert!(prompter.dispatch(Intent::Start).is_empty());
        assert!(prompter.state().is_started());
        assert!(!prompter.state().is_playing());

        let effects = prompter.dispatch(Intent::TogglePlay);
        assert!(prompter.state().is_playing());
        let mut token = frame_token(&effects).expect("play schedules a frame");

        let layout = layout_with_bound(1000.0);
        let mut now = Instant::now();
        let mut finished = false;
        for _ in 0..20_000 {
            let effects = prompter.on_frame(token, now, &layout);
            if effects.contains(&Effect::Notify(Notice::ReachedEnd)) {
                finished = true;
                break;
            }
            token = frame_token(&effects).expect("next frame while playing");
            now += Duration::from_millis(16);
        }

        assert!(finished, "playback should reach the bound");
        assert_eq!(prompter.state().position(), 1000.0);
        assert!(!prompter.state().is_playing());
        assert_eq!(prompter.pending_frame(), None);
        assert_eq!(prompter.state().progress(), 100.0);
    }

    #[test]
    fn start_without_script_reports_failure() {
        let mut prompter = Prompter::new(MemoryStore::new(), "script.json");
        let effects = prompter.dispatch(Intent::Start);
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::Rejected(Rejection::NothingLoaded))]
        );
        assert!(!prompter.state().is_started());
    }

    #[test]
    fn pausing_cancels_outstanding_frame() {
        let mut prompter = loaded_prompter();
        prompter.dispatch(Intent::Start);
        let token = frame_token(&prompter.dispatch(Intent::TogglePlay)).expect("frame");
        prompter.dispatch(Intent::TogglePlay);
        assert_eq!(prompter.pending_frame(), None);

        let effects = prompter.on_frame(token, Instant::now(), &layout_with_bound(500.0));
        assert!(effects.is_empty());
        assert_eq!(prompter.state().max_scroll(), 0.0);
    }

    #[test]
    fn preview_and_go_home_stop_the_loop() {
        let mut prompter = loaded_prompter();
        prompter.dispatch(Intent::Start);
        prompter.dispatch(Intent::SetPlaying(true));
        assert!(prompter.pending_frame().is_some());
        prompter.dispatch(Intent::SetPreviewMode(true));
        assert_eq!(prompter.pending_frame(), None);
        assert!(!prompter.state().is_playing());

        prompter.dispatch(Intent::SetPreviewMode(false));
        prompter.dispatch(Intent::SetPlaying(true));
        assert!(prompter.pending_frame().is_some());
        prompter.dispatch(Intent::GoHome);
        assert_eq!(prompter.pending_frame(), None);
        assert!(!prompter.state().is_started());
    }

    #[test]
    fn resume_starts_a_fresh_loop() {
        let mut prompter = loaded_prompter();
        prompter.dispatch(Intent::Start);
        let first = frame_token(&prompter.dispatch(Intent::TogglePlay)).expect("frame");
        prompter.dispatch(Intent::TogglePlay);
        let second = frame_token(&prompter.dispatch(Intent::TogglePlay)).expect("frame");
        assert_ne!(first, second);
    }

    #[test]
    fn settings_are_persisted_after_changes() {
        let mut prompter = loaded_prompter();
        prompter.dispatch(Intent::SetSpeed(0.6));
        prompter.dispatch(Intent::AddBookmark("Intro".to_string()));
        prompter.dispatch(Intent::SetSpeakerAlias(Speaker::B, "Jo".to_string()));

        let store = prompter.store();
        assert_eq!(store.get(StoreKey::Speed).as_deref(), Some("0.6"));
        let bookmarks: Vec<Bookmark> =
            serde_json::from_str(&store.get(StoreKey::Bookmarks).expect("bookmarks saved"))
                .expect("bookmark json");
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].name, "Intro");
        let aliases = SpeakerAliases::from_json(
            &store
                .get(StoreKey::SpeakerAliases)
                .expect("aliases saved"),
        )
        .expect("alias json");
        assert_eq!(aliases.get(Speaker::B), "Jo");
    }

    #[test]
    fn persistence_failure_never_blocks_the_update() {
        let mut prompter = Prompter::new(MemoryStore::read_only(), "script.json");
        prompter.apply_load("script.json", Ok(three_lines()));
        prompter.dispatch(Intent::SetSpeed(0.9));
        let effects = prompter.dispatch(Intent::AddBookmark("Intro".to_string()));
        assert_eq!(prompter.state().speed(), 0.9);
        assert_eq!(prompter.state().bookmarks().len(), 1);
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::BookmarkAdded {
                name: "Intro".to_string()
            })]
        );
    }

    #[test]
    fn hydration_keys_are_independent() {
        let store = MemoryStore::new()
            .with(StoreKey::Speed, "fast please")
            .with(StoreKey::Bookmarks, r#"[{"id":"7","name":"Outro","position":900.0}]"#)
            .with(StoreKey::SpeakerAliases, "{broken");
        let prompter = Prompter::new(store, "script.json");
        let state = prompter.state();
        assert_eq!(state.speed(), crate::session::DEFAULT_SPEED);
        assert_eq!(state.bookmarks().len(), 1);
        assert_eq!(state.bookmarks()[0].name, "Outro");
        assert_eq!(state.speaker_aliases(), &SpeakerAliases::default());
    }

    #[test]
    fn stored_speed_is_clamped_on_hydrate() {
        let store = MemoryStore::new().with(StoreKey::Speed, "7.5");
        let prompter = Prompter::new(store, "script.json");
        assert_eq!(prompter.state().speed(), 1.0);
    }

    #[test]
    fn bookmark_from_start_screen_lands_once_bound_is_known() {
        let store = MemoryStore::new().with(
            StoreKey::Bookmarks,
            r#"[{"id":"7","name":"Middle","position":400.0}]"#,
        );
        let mut prompter = Prompter::new(store, "script.json");
        prompter.apply_load("script.json", Ok(three_lines()));
        prompter.dispatch(Intent::GoToBookmark("7".to_string()));
        prompter.dispatch(Intent::Start);
        let token = frame_token(&prompter.dispatch(Intent::TogglePlay)).expect("frame");

        prompter.on_frame(token, Instant::now(), &layout_with_bound(1000.0));
        assert_eq!(prompter.state().position(), 400.0);
    }

    #[test]
    fn unknown_bookmark_is_reported() {
        let mut prompter = loaded_prompter();
        let effects = prompter.dispatch(Intent::GoToBookmark("nope".to_string()));
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::UnknownBookmark {
                id: "nope".to_string()
            })]
        );
    }

    #[test]
    fn failed_load_is_surfaced() {
        let mut prompter = loaded_prompter();
        let effects = prompter.apply_load("missing.json", Err(LoadError::NotASequence));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notify(Notice::LoadFailed { source, .. })] if source == "missing.json"
        ));
        assert_eq!(prompter.state().script_source(), "missing.json");
        assert!(prompter.state().error().is_some());
    }

    #[test]
    fn loading_mid_playback_keeps_the_loop_and_remeasures() {
        let mut prompter = loaded_prompter();
        prompter.dispatch(Intent::Start);
        let token = frame_token(&prompter.dispatch(Intent::TogglePlay)).expect("frame");
        let t0 = Instant::now();
        let token = frame_token(&prompter.on_frame(token, t0, &layout_with_bound(1000.0)))
            .expect("first frame");
        let token = frame_token(&prompter.on_frame(
            token,
            t0 + Duration::from_millis(500),
            &layout_with_bound(1000.0),
        ))
        .expect("second frame");
        assert!(prompter.state().position() > 0.0);
        prompter.dispatch(Intent::SetSpeed(0.8));
        prompter.dispatch(Intent::AddBookmark("Before swap".to_string()));

        let effects = prompter.apply_load("episode1.json", Ok(three_lines()));
        assert_eq!(frame_token(&effects), None);
        let state = prompter.state();
        assert!(state.is_playing());
        assert!(state.is_started());
        assert_eq!(state.speed(), 0.8);
        assert_eq!(state.bookmarks().len(), 1);
        assert_eq!(state.position(), 0.0);
        assert_eq!(state.max_scroll(), 0.0);
        assert_eq!(prompter.pending_frame(), Some(token));

        let effects = prompter.on_frame(
            token,
            t0 + Duration::from_millis(516),
            &layout_with_bound(2000.0),
        );
        let token = frame_token(&effects).expect("loop continues on the new script");
        assert_eq!(prompter.state().max_scroll(), 2000.0);
        assert!(prompter.state().position() > 0.0);

        let effects = prompter.apply_load("broken.json", Err(LoadError::NotASequence));
        assert_eq!(frame_token(&effects), None);
        let state = prompter.state();
        assert!(state.is_playing());
        assert!(state.error().is_some());
        assert_eq!(state.speed(), 0.8);
        assert_eq!(state.bookmarks().len(), 1);
        assert_eq!(prompter.pending_frame(), Some(token));
    }

    #[test]
    fn export_round_trips_through_loader_format() {
        let prompter = loaded_prompter();
        let exported = prompter.export().expect("export");
        assert_eq!(parse_script(&exported).expect("parse export"), three_lines());
    }
}
