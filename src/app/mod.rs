//! Desktop front end built on iced.
//!
//! The scroll engine is ticked from the window's frame callback
//! (`window::frames`), subscribed to only while a frame is scheduled. Key
//! presses arrive as runtime events and map to player shortcuts.

mod messages;
mod shortcuts;
mod state;
mod update;
mod view;

use messages::Message;
use state::App;

use crate::config::AppConfig;
use iced::{Size, Task, Theme, window};
use prompter_core::{KeyValueStore, Prompter};
use tracing::info;

/// Open the prompter window and load the session's script.
pub fn run_app<S: KeyValueStore + 'static>(
    prompter: Prompter<S>,
    config: AppConfig,
) -> iced::Result {
    let window_settings = window::Settings {
        size: Size::new(config.window_width, config.window_height),
        ..window::Settings::default()
    };

    iced::application("Prompter", App::<S>::update, App::<S>::view)
        .window(window_settings)
        .subscription(App::<S>::subscription)
        .theme(|_: &App<S>| Theme::Dark)
        .run_with(move || App::bootstrap(prompter, config))
}

impl<S: KeyValueStore> App<S> {
    fn bootstrap(prompter: Prompter<S>, config: AppConfig) -> (Self, Task<Message>) {
        let source = prompter.state().script_source().to_string();
        let mut app = App::new(prompter, config);
        info!(%source, "Loading initial script");
        let effect = app.begin_load(source);
        let task = app.run_effect(effect);
        (app, task)
    }
}
