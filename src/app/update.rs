use super::messages::Message;
use super::state::{App, BOOKMARK_INPUT_ID, PLAYER_SCROLL_ID, Screen, viewport_for_window};
use iced::event::{self, Event};
use iced::futures::channel::oneshot;
use iced::keyboard;
use iced::widget::scrollable::{self, AbsoluteOffset};
use iced::widget::text_input;
use iced::{Subscription, Task, window};
use prompter_core::{
    CancellationToken, EXPORT_FILE_NAME, Effect as CoreEffect, Intent, KeyValueStore, LoadError,
    ScriptLine, ScriptLoader, SourceLoader, import_script,
};
use std::fs;
use std::path::PathBuf;
use std::thread;
use tracing::{debug, info, warn};

/// Offsets closer than this to the session position are our own scroll.
const SCROLL_ECHO_TOLERANCE: f64 = 0.5;

/// Work that must be performed outside the reducer.
#[derive(Debug, PartialEq)]
pub(super) enum Effect {
    Core(CoreEffect),
    LoadScript { request_id: u64, source: String },
    ImportScript { request_id: u64, path: PathBuf },
    ExportScript(PathBuf),
    FocusBookmarkPrompt,
    Quit,
}

impl<S: KeyValueStore> App<S> {
    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions: Vec<Subscription<Message>> =
            vec![event::listen_with(runtime_event_to_message)];

        if self.frame_pending() {
            subscriptions.push(window::frames().map(Message::Frame));
        }

        Subscription::batch(subscriptions)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        let effects = self.reduce(message);
        let mut tasks: Vec<Task<Message>> = effects
            .into_iter()
            .map(|effect| self.run_effect(effect))
            .collect();
        tasks.push(self.sync_layout());
        tasks.push(self.sync_scroll());
        Task::batch(tasks)
    }

    pub(super) fn reduce(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = Vec::new();

        match message {
            Message::LoadScript(source) => self.request_load(source, &mut effects),
            Message::SourceInputChanged(value) => self.source_input = value,
            Message::SourceSubmitted => {
                let source = self.source_input.trim().to_string();
                if source.is_empty() {
                    self.status = Some("Enter a script URL or file path".to_string());
                } else {
                    self.request_load(source, &mut effects);
                }
            }
            Message::ImportPathChanged(value) => self.import_input = value,
            Message::ImportRequested => {
                let path = self.import_input.trim().to_string();
                if path.is_empty() {
                    self.status = Some("Enter the path of a script file to import".to_string());
                } else {
                    effects.push(self.begin_import(PathBuf::from(path)));
                }
            }
            Message::ExportRequested => {
                effects.push(Effect::ExportScript(PathBuf::from(EXPORT_FILE_NAME)));
            }
            Message::PreviewToggled(enabled) => {
                self.dispatch(Intent::SetPreviewMode(enabled), &mut effects);
            }
            Message::AliasChanged(speaker, name) => {
                self.dispatch(Intent::SetSpeakerAlias(speaker, name), &mut effects);
            }
            Message::SpeedChanged(speed) => self.dispatch(Intent::SetSpeed(speed), &mut effects),
            Message::GoToBookmark(id) => self.dispatch(Intent::GoToBookmark(id), &mut effects),
            Message::Start => self.dispatch(Intent::Start, &mut effects),
            Message::TogglePlayPause => self.dispatch(Intent::TogglePlay, &mut effects),
            Message::SpeedUp => {
                self.dispatch(Intent::AdjustSpeed(self.config.speed_step), &mut effects);
            }
            Message::SpeedDown => {
                self.dispatch(Intent::AdjustSpeed(-self.config.speed_step), &mut effects);
            }
            Message::Rewind => self.dispatch(Intent::Rewind, &mut effects),
            Message::GoHome => {
                self.bookmark_prompt = None;
                self.dispatch(Intent::GoHome, &mut effects);
            }
            Message::Quit => effects.push(Effect::Quit),
            Message::BookmarkPromptOpened => {
                if self.screen() == Screen::Player {
                    self.bookmark_prompt = Some(String::new());
                    effects.push(Effect::FocusBookmarkPrompt);
                }
            }
            Message::BookmarkNameChanged(name) => {
                if let Some(prompt) = self.bookmark_prompt.as_mut() {
                    *prompt = name;
                }
            }
            Message::BookmarkSubmitted => {
                if let Some(name) = self.bookmark_prompt.take() {
                    self.dispatch(Intent::AddBookmark(name), &mut effects);
                }
            }
            Message::BookmarkCancelled => self.bookmark_prompt = None,
            Message::Scrolled(offset) => self.handle_scrolled(offset, &mut effects),
            Message::Frame(now) => {
                if let Some(token) = self.scheduled.take() {
                    let core = self.prompter.on_frame(token, now, &self.layout);
                    effects.extend(core.into_iter().map(Effect::Core));
                }
            }
            Message::WindowResized { height } => {
                self.layout.viewport_height = viewport_for_window(height);
                debug!(
                    height,
                    viewport = self.layout.viewport_height,
                    "Window resized"
                );
            }
            Message::KeyPressed { key, modifiers } => {
                if let Some(shortcut) = self.shortcut_message_for_key(key, modifiers) {
                    effects.extend(self.reduce(shortcut));
                }
            }
            Message::ScriptLoaded {
                request_id,
                source,
                result,
            } => self.handle_script_loaded(request_id, source, result, &mut effects),
        }

        effects
    }

    fn request_load(&mut self, source: String, effects: &mut Vec<Effect>) {
        self.dispatch(Intent::SetScriptSource(source.clone()), effects);
        effects.push(self.begin_load(source));
    }

    pub(super) fn begin_load(&mut self, source: String) -> Effect {
        let request_id = self.next_load_request(&source);
        Effect::LoadScript { request_id, source }
    }

    fn begin_import(&mut self, path: PathBuf) -> Effect {
        let request_id = self.next_load_request(&path.display().to_string());
        Effect::ImportScript { request_id, path }
    }

    /// Supersede whatever load is still in flight.
    fn next_load_request(&mut self, label: &str) -> u64 {
        self.load_cancel.cancel();
        self.load_cancel = CancellationToken::new();
        self.load_request_id += 1;
        self.loading = Some(label.to_string());
        self.load_request_id
    }

    fn handle_script_loaded(
        &mut self,
        request_id: u64,
        source: String,
        result: Result<Vec<ScriptLine>, LoadError>,
        effects: &mut Vec<Effect>,
    ) {
        if request_id != self.load_request_id {
            debug!(request_id, %source, "Dropping stale script load");
            return;
        }
        self.loading = None;
        let core = self.prompter.apply_load(&source, result);
        effects.extend(core.into_iter().map(Effect::Core));
    }

    fn handle_scrolled(&mut self, offset: f64, effects: &mut Vec<Effect>) {
        let state = self.prompter.state();
        if self.screen() != Screen::Player || state.is_playing() {
            return;
        }
        if (offset - state.position()).abs() < SCROLL_ECHO_TOLERANCE {
            return;
        }
        self.dispatch(Intent::SetPosition(offset), effects);
        self.scrolled_to = Some(self.prompter.state().position());
    }

    fn dispatch(&mut self, intent: Intent, effects: &mut Vec<Effect>) {
        let core = self.prompter.dispatch(intent);
        effects.extend(core.into_iter().map(Effect::Core));
    }

    pub(super) fn run_effect(&mut self, effect: Effect) -> Task<Message> {
        match effect {
            Effect::Core(CoreEffect::ScheduleFrame(token)) => {
                self.scheduled = Some(token);
                Task::none()
            }
            Effect::Core(CoreEffect::Notify(notice)) => {
                info!(%notice, "Notice");
                self.status = Some(notice.to_string());
                Task::none()
            }
            Effect::LoadScript { request_id, source } => {
                let cancel = self.load_cancel.clone();
                let label = source.clone();
                spawn_load(request_id, label, move || {
                    SourceLoader.load_with(&source, &cancel)
                })
            }
            Effect::ImportScript { request_id, path } => {
                let cancel = self.load_cancel.clone();
                let label = path.display().to_string();
                spawn_load(request_id, label, move || import_script(&path, &cancel))
            }
            Effect::ExportScript(path) => {
                self.export_to(path);
                Task::none()
            }
            Effect::FocusBookmarkPrompt => text_input::focus(BOOKMARK_INPUT_ID.clone()),
            Effect::Quit => {
                info!("Quitting prompter");
                self.load_cancel.cancel();
                iced::exit()
            }
        }
    }

    fn export_to(&mut self, path: PathBuf) {
        let written = self
            .prompter
            .export()
            .map_err(anyhow::Error::from)
            .and_then(|json| fs::write(&path, json).map_err(anyhow::Error::from));
        match written {
            Ok(()) => {
                info!(path = %path.display(), "Exported script");
                self.status = Some(format!("Exported script to {}", path.display()));
            }
            Err(err) => {
                warn!(path = %path.display(), "Export failed: {err:#}");
                self.status = Some(format!("Export failed: {err}"));
            }
        }
    }

    /// Keep the layout in step with the session and report the scroll bound
    /// whenever the player is on screen.
    fn sync_layout(&mut self) -> Task<Message> {
        self.layout.line_count = self.prompter.state().lines().len();
        self.layout.mounted = self.screen() == Screen::Player;
        if !self.layout.mounted {
            self.bookmark_prompt = None;
            return Task::none();
        }
        let bound = self.layout.extent().max_scroll();
        if (bound - self.prompter.state().max_scroll()).abs() <= f64::EPSILON {
            return Task::none();
        }
        let mut effects = Vec::new();
        self.dispatch(Intent::UpdateMaxScroll(bound), &mut effects);
        Task::batch(effects.into_iter().map(|effect| self.run_effect(effect)))
    }

    /// Move the player's scrollable to the session position.
    fn sync_scroll(&mut self) -> Task<Message> {
        if !self.layout.mounted {
            self.scrolled_to = None;
            return Task::none();
        }
        let position = self.prompter.state().position();
        if self.scrolled_to == Some(position) {
            return Task::none();
        }
        self.scrolled_to = Some(position);
        scrollable::scroll_to(
            PLAYER_SCROLL_ID.clone(),
            AbsoluteOffset {
                x: 0.0,
                y: position as f32,
            },
        )
    }
}

/// Run a blocking load on its own thread and report back as a message.
fn spawn_load<F>(request_id: u64, source: String, job: F) -> Task<Message>
where
    F: FnOnce() -> Result<Vec<ScriptLine>, LoadError> + Send + 'static,
{
    Task::perform(
        async move {
            let (sender, receiver) = oneshot::channel();
            let spawned = thread::Builder::new()
                .name("script-load".to_string())
                .spawn(move || {
                    let _ = sender.send(job());
                });
            if let Err(err) = spawned {
                warn!(%source, "Failed to start script load: {err}");
            }
            let result = receiver
                .await
                .unwrap_or(Err(LoadError::Cancelled { stage: "worker" }));
            Message::ScriptLoaded {
                request_id,
                source,
                result,
            }
        },
        |message| message,
    )
}

pub(super) fn runtime_event_to_message(
    event: Event,
    status: event::Status,
    _window_id: window::Id,
) -> Option<Message> {
    if status == event::Status::Captured {
        return None;
    }
    match event {
        Event::Window(window::Event::Resized(size)) => {
            Some(Message::WindowResized { height: size.height })
        }
        Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) => {
            Some(Message::KeyPressed { key, modifiers })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::state::STATUS_BAR_HEIGHT;
    use super::*;
    use crate::config::AppConfig;
    use iced::keyboard::{Key, Modifiers, key};
    use prompter_core::{MemoryStore, Prompter, Speaker, SpeakerRole};
    use std::time::{Duration, Instant};

    fn app_with_lines(lines: usize) -> App<MemoryStore> {
        let mut app = App::new(
            Prompter::new(MemoryStore::new(), "script.json"),
            AppConfig {
                line_height: 10.0,
                font_size: 8.0,
                window_height: 100.0 + STATUS_BAR_HEIGHT,
                ..AppConfig::default()
            },
        );
        let script = (0..lines)
            .map(|i| ScriptLine::new(SpeakerRole::SpeakerA, format!("Andreas: line {i}")))
            .collect();
        app.load_request_id = 1;
        send(
            &mut app,
            Message::ScriptLoaded {
                request_id: 1,
                source: "script.json".to_string(),
                result: Ok(script),
            },
        );
        app
    }

    fn send(app: &mut App<MemoryStore>, message: Message) {
        let _ = app.update(message);
    }

    fn press(app: &mut App<MemoryStore>, ch: &str) {
        send(
            app,
            Message::KeyPressed {
                key: Key::Character(ch.into()),
                modifiers: Modifiers::default(),
            },
        );
    }

    fn press_space(app: &mut App<MemoryStore>) {
        send(
            app,
            Message::KeyPressed {
                key: Key::Named(key::Named::Space),
                modifiers: Modifiers::default(),
            },
        );
    }

    fn add_bookmark(app: &mut App<MemoryStore>, name: &str) {
        press(app, "b");
        send(app, Message::BookmarkNameChanged(name.to_string()));
        send(app, Message::BookmarkSubmitted);
    }

    #[test]
    fn start_then_space_schedules_a_frame() {
        let mut app = app_with_lines(10);
        send(&mut app, Message::Start);
        assert_eq!(app.screen(), Screen::Player);
        assert!(!app.frame_pending());
        assert!((app.prompter.state().max_scroll() - 350.0).abs() < 1e-9);

        press_space(&mut app);
        assert!(app.prompter.state().is_playing());
        assert!(app.frame_pending());
    }

    #[test]
    fn frames_advance_until_paused() {
        let mut app = app_with_lines(10);
        send(&mut app, Message::Start);
        press_space(&mut app);
        let t0 = Instant::now();
        send(&mut app, Message::Frame(t0));
        send(&mut app, Message::Frame(t0 + Duration::from_millis(100)));
        let moved = app.prompter.state().position();
        assert!(moved > 0.0);
        assert_eq!(app.scrolled_to, Some(moved));

        press_space(&mut app);
        assert!(!app.prompter.state().is_playing());
        send(&mut app, Message::Frame(t0 + Duration::from_millis(200)));
        assert_eq!(app.prompter.state().position(), moved);
        assert!(!app.frame_pending());
    }

    #[test]
    fn speed_keys_use_the_configured_step() {
        let mut app = app_with_lines(3);
        send(&mut app, Message::Start);
        press(&mut app, "+");
        assert!((app.prompter.state().speed() - 0.40).abs() < 1e-9);
        press(&mut app, "-");
        press(&mut app, "-");
        assert!((app.prompter.state().speed() - 0.30).abs() < 1e-9);
    }

    #[test]
    fn bookmark_prompt_rejects_a_blank_name() {
        let mut app = app_with_lines(3);
        send(&mut app, Message::Start);
        let effects = app.reduce(Message::KeyPressed {
            key: Key::Character("b".into()),
            modifiers: Modifiers::default(),
        });
        assert_eq!(effects, vec![Effect::FocusBookmarkPrompt]);
        assert_eq!(app.bookmark_prompt.as_deref(), Some(""));

        send(&mut app, Message::BookmarkSubmitted);
        assert!(app.prompter.state().bookmarks().is_empty());
        assert!(app.status.is_some());
        assert_eq!(app.bookmark_prompt, None);

        add_bookmark(&mut app, "Intro");
        assert_eq!(app.prompter.state().bookmarks().len(), 1);
        assert_eq!(app.prompter.state().bookmarks()[0].name, "Intro");
    }

    #[test]
    fn cancelled_prompt_adds_nothing() {
        let mut app = app_with_lines(3);
        send(&mut app, Message::Start);
        press(&mut app, "b");
        send(&mut app, Message::BookmarkNameChanged("Draft".to_string()));
        send(
            &mut app,
            Message::KeyPressed {
                key: Key::Named(key::Named::Escape),
                modifiers: Modifiers::default(),
            },
        );
        send(&mut app, Message::BookmarkSubmitted);
        assert_eq!(app.bookmark_prompt, None);
        assert!(app.prompter.state().bookmarks().is_empty());
    }

    #[test]
    fn go_home_returns_to_the_start_screen() {
        let mut app = app_with_lines(3);
        send(&mut app, Message::Start);
        press_space(&mut app);
        press(&mut app, "h");
        assert_eq!(app.screen(), Screen::Start);
        assert!(!app.prompter.state().is_playing());
        assert!(!app.layout.mounted);
        assert_eq!(app.scrolled_to, None);
    }

    #[test]
    fn bookmark_from_start_applies_once_the_player_is_shown() {
        let mut app = app_with_lines(10);
        send(&mut app, Message::Start);
        press_space(&mut app);
        let t0 = Instant::now();
        send(&mut app, Message::Frame(t0));
        send(&mut app, Message::Frame(t0 + Duration::from_millis(500)));
        press_space(&mut app);
        add_bookmark(&mut app, "Middle");
        let marked = app.prompter.state().position();
        press(&mut app, "h");

        let reloaded = (0..10)
            .map(|i| ScriptLine::new(SpeakerRole::SpeakerB, format!("line {i}")))
            .collect();
        send(
            &mut app,
            Message::ScriptLoaded {
                request_id: 1,
                source: "script.json".to_string(),
                result: Ok(reloaded),
            },
        );
        assert_eq!(app.prompter.state().max_scroll(), 0.0);

        let id = app.prompter.state().bookmarks()[0].id.clone();
        send(&mut app, Message::GoToBookmark(id));
        assert_eq!(app.prompter.state().position(), 0.0);
        send(&mut app, Message::Start);
        assert!((app.prompter.state().position() - marked).abs() < 1e-9);
    }

    #[test]
    fn stale_loads_are_dropped() {
        let mut app = app_with_lines(2);
        let effect = app.begin_load("episode1.json".to_string());
        assert_eq!(
            effect,
            Effect::LoadScript {
                request_id: 2,
                source: "episode1.json".to_string()
            }
        );
        send(
            &mut app,
            Message::ScriptLoaded {
                request_id: 1,
                source: "old.json".to_string(),
                result: Ok(Vec::new()),
            },
        );
        assert_eq!(app.prompter.state().lines().len(), 2);
        assert!(app.loading.is_some());
    }

    #[test]
    fn a_new_load_cancels_the_one_in_flight() {
        let mut app = app_with_lines(2);
        app.begin_load("episode1.json".to_string());
        let first = app.load_cancel.clone();
        app.begin_load("script.json".to_string());
        assert!(first.is_cancelled());
        assert!(!app.load_cancel.is_cancelled());
    }

    #[test]
    fn script_buttons_load_and_set_the_source() {
        let mut app = app_with_lines(2);
        let effects = app.reduce(Message::LoadScript("episode1.json".to_string()));
        assert!(effects.contains(&Effect::LoadScript {
            request_id: 2,
            source: "episode1.json".to_string(),
        }));
        assert_eq!(app.prompter.state().script_source(), "episode1.json");
        assert_eq!(app.loading.as_deref(), Some("episode1.json"));
    }

    #[test]
    fn source_and_import_inputs_need_a_value() {
        let mut app = app_with_lines(2);
        assert!(app.reduce(Message::SourceSubmitted).is_empty());
        assert!(app.status.is_some());
        assert!(app.reduce(Message::ImportRequested).is_empty());

        send(&mut app, Message::ImportPathChanged(" notes/show.json ".to_string()));
        let effects = app.reduce(Message::ImportRequested);
        assert_eq!(
            effects,
            vec![Effect::ImportScript {
                request_id: 2,
                path: PathBuf::from("notes/show.json"),
            }]
        );
    }

    #[test]
    fn start_screen_controls_update_settings() {
        let mut app = app_with_lines(2);
        send(&mut app, Message::AliasChanged(Speaker::B, "Bernd".to_string()));
        assert_eq!(app.prompter.state().speaker_aliases().get(Speaker::B), "Bernd");
        send(&mut app, Message::SpeedChanged(5.0));
        assert!((app.prompter.state().speed() - 1.0).abs() < 1e-9);
        send(&mut app, Message::PreviewToggled(true));
        send(&mut app, Message::Start);
        assert_eq!(app.screen(), Screen::Preview);
        assert!(!app.layout.mounted);
        press_space(&mut app);
        assert!(!app.prompter.state().is_playing());
    }

    #[test]
    fn resize_remeasures_the_bound() {
        let mut app = app_with_lines(10);
        send(&mut app, Message::Start);
        assert!((app.prompter.state().max_scroll() - 350.0).abs() < 1e-9);
        send(
            &mut app,
            Message::WindowResized {
                height: 200.0 + STATUS_BAR_HEIGHT,
            },
        );
        assert!((app.prompter.state().max_scroll() - 400.0).abs() < 1e-9);
    }

    #[test]
    fn manual_scroll_moves_only_a_paused_player() {
        let mut app = app_with_lines(10);
        send(&mut app, Message::Start);
        send(&mut app, Message::Scrolled(120.0));
        assert_eq!(app.prompter.state().position(), 120.0);
        assert_eq!(app.scrolled_to, Some(120.0));

        press_space(&mut app);
        send(&mut app, Message::Scrolled(10.0));
        assert_eq!(app.prompter.state().position(), 120.0);
    }

    #[test]
    fn quit_cancels_the_load_in_flight() {
        let mut app = app_with_lines(1);
        app.begin_load("episode1.json".to_string());
        let in_flight = app.load_cancel.clone();
        send(&mut app, Message::Start);
        let effects = app.reduce(Message::KeyPressed {
            key: Key::Character("q".into()),
            modifiers: Modifiers::default(),
        });
        assert_eq!(effects, vec![Effect::Quit]);
        let _ = app.run_effect(Effect::Quit);
        assert!(in_flight.is_cancelled());
    }

    #[test]
    fn export_writes_the_current_script() {
        let mut app = app_with_lines(2);
        let path = std::env::temp_dir().join(format!(
            "prompter-export-{}.json",
            std::process::id()
        ));
        let _ = app.run_effect(Effect::ExportScript(path.clone()));
        let written = fs::read_to_string(&path).expect("export written");
        let parsed = prompter_core::parse_script(&written).expect("export parses");
        assert_eq!(parsed.len(), 2);
        assert!(app.status.as_deref().is_some_and(|s| s.starts_with("Exported")));
        let _ = fs::remove_file(path);
    }
}
