use super::messages::Message;
use super::state::{App, BOOKMARK_INPUT_ID, PLAYER_SCROLL_ID, STATUS_BAR_HEIGHT, Screen};
use iced::alignment::Vertical;
use iced::widget::text::{LineHeight, Wrapping};
use iced::widget::{
    Column, Row, Space, button, checkbox, column, container, row, scrollable, slider, text,
    text_input,
};
use iced::{Color, Element, Length, Pixels};
use prompter_core::engine::TRAILING_MARGIN;
use prompter_core::session::{MAX_SPEED, MIN_SPEED};
use prompter_core::{Bookmark, KeyValueStore, Speaker, SpeakerRole, display_text};

const ERROR_COLOR: Color = Color::from_rgb(1.0, 0.45, 0.45);

impl<S: KeyValueStore> App<S> {
    pub fn view(&self) -> Element<'_, Message> {
        match self.screen() {
            Screen::Start => self.start_view(),
            Screen::Preview => self.preview_view(),
            Screen::Player => self.player_view(),
        }
    }

    fn start_view(&self) -> Element<'_, Message> {
        let state = self.prompter.state();

        let mut scripts = Row::new().spacing(8);
        for source in &self.config.available_scripts {
            let label = if source == state.script_source() {
                format!("* {source}")
            } else {
                source.clone()
            };
            scripts = scripts.push(button(text(label)).on_press(Message::LoadScript(source.clone())));
        }

        let source_row = row![
            text_input("Script URL or file path", &self.source_input)
                .on_input(Message::SourceInputChanged)
                .on_submit(Message::SourceSubmitted)
                .width(Length::Fill),
            button("Load").on_press(Message::SourceSubmitted),
        ]
        .spacing(8);

        let import_row = row![
            text_input("Script file to import", &self.import_input)
                .on_input(Message::ImportPathChanged)
                .on_submit(Message::ImportRequested)
                .width(Length::Fill),
            button("Import").on_press(Message::ImportRequested),
            button("Export").on_press(Message::ExportRequested),
        ]
        .spacing(8);

        let aliases = state.speaker_aliases();
        let alias_row = row![
            text_input(Speaker::A.default_name(), aliases.get(Speaker::A))
                .on_input(|name| Message::AliasChanged(Speaker::A, name)),
            text_input(Speaker::B.default_name(), aliases.get(Speaker::B))
                .on_input(|name| Message::AliasChanged(Speaker::B, name)),
        ]
        .spacing(8);

        let speed = column![
            text(format!("Speed: {:.2}", state.speed())),
            slider(MIN_SPEED..=MAX_SPEED, state.speed(), Message::SpeedChanged).step(0.01),
        ]
        .spacing(4);

        let mut content = column![text("Prompter").size(32), text(self.script_summary())].spacing(12);
        if let Some(error) = state.error() {
            content = content.push(text(error.to_string()).color(ERROR_COLOR));
        }
        content = content
            .push(scripts)
            .push(source_row)
            .push(import_row)
            .push(text("Speakers"))
            .push(alias_row)
            .push(speed)
            .push(checkbox("Preview mode", state.preview_mode()).on_toggle(Message::PreviewToggled));

        if !state.bookmarks().is_empty() {
            let mut bookmarks = Column::new().spacing(4);
            for bookmark in state.bookmarks() {
                bookmarks = bookmarks.push(
                    button(text(bookmark_label(bookmark)))
                        .on_press(Message::GoToBookmark(bookmark.id.clone())),
                );
            }
            content = content.push(text("Bookmarks")).push(bookmarks);
        }
        if let Some(note) = self.note() {
            content = content.push(text(note));
        }
        content = content.push(button("Start").on_press(Message::Start));

        scrollable(container(content).padding(24).width(Length::Fill)).into()
    }

    fn preview_view(&self) -> Element<'_, Message> {
        let state = self.prompter.state();
        let mut lines = Column::new().spacing(8).padding(24).width(Length::Fill);
        for line in state.lines() {
            lines = lines.push(
                text(display_text(line, state.speaker_aliases()))
                    .size(self.config.font_size)
                    .wrapping(Wrapping::WordOrGlyph)
                    .color(line_color(line.kind, true)),
            );
        }
        column![
            scrollable(lines).width(Length::Fill).height(Length::Fill),
            self.status_bar()
        ]
        .into()
    }

    /// One fixed-height row per line between the lead-in and the tail, so the
    /// scrollable's range matches the bound the engine measures.
    fn player_view(&self) -> Element<'_, Message> {
        let state = self.prompter.state();
        let focus = self.layout.focus_line(state.position());
        let line_height = LineHeight::Absolute(Pixels(self.layout.line_height as f32));

        let mut lines = Column::new()
            .width(Length::Fill)
            .push(Space::with_height(self.layout.viewport_height as f32));
        for (idx, line) in state.lines().iter().enumerate() {
            lines = lines.push(
                text(display_text(line, state.speaker_aliases()))
                    .size(self.config.font_size)
                    .line_height(line_height)
                    .wrapping(Wrapping::None)
                    .color(line_color(line.kind, focus == Some(idx))),
            );
        }
        lines = lines
            .push(Space::with_height(self.layout.tail_height() as f32))
            .push(Space::with_height(TRAILING_MARGIN as f32));

        let script = scrollable(lines)
            .id(PLAYER_SCROLL_ID.clone())
            .on_scroll(|viewport| Message::Scrolled(f64::from(viewport.absolute_offset().y)))
            .width(Length::Fill)
            .height(Length::Fill);

        column![script, self.status_bar()].into()
    }

    fn status_bar(&self) -> Element<'_, Message> {
        let content: Element<'_, Message> = match &self.bookmark_prompt {
            Some(name) => row![
                text("Bookmark name:"),
                text_input("Intro", name)
                    .id(BOOKMARK_INPUT_ID.clone())
                    .on_input(Message::BookmarkNameChanged)
                    .on_submit(Message::BookmarkSubmitted)
                    .width(Length::Fill),
                button("Add").on_press(Message::BookmarkSubmitted),
                button("Cancel").on_press(Message::BookmarkCancelled),
            ]
            .spacing(8)
            .align_y(Vertical::Center)
            .into(),
            None => {
                let mut bar = row![text(self.status_line())]
                    .spacing(16)
                    .align_y(Vertical::Center);
                if let Some(note) = self.note() {
                    bar = bar.push(text(note));
                }
                bar.into()
            }
        };
        container(content)
            .padding(8)
            .width(Length::Fill)
            .height(STATUS_BAR_HEIGHT)
            .align_y(Vertical::Center)
            .into()
    }

    pub(super) fn status_line(&self) -> String {
        let state = self.prompter.state();
        match self.screen() {
            Screen::Preview => format!(
                "Preview: {}  [{}] home  [{}] quit",
                state.script_source(),
                self.config.key_go_home,
                self.config.key_quit
            ),
            Screen::Start | Screen::Player => format!(
                "[{}] {:.0}%  speed {:.2}",
                if state.is_playing() { "playing" } else { "paused" },
                state.progress(),
                state.speed()
            ),
        }
    }

    pub(super) fn script_summary(&self) -> String {
        let state = self.prompter.state();
        format!(
            "Script: {} ({} lines)",
            state.script_source(),
            state.lines().len()
        )
    }

    /// Pending load first, then the latest notice.
    pub(super) fn note(&self) -> Option<String> {
        match (&self.loading, &self.status) {
            (Some(loading), _) => Some(format!("Loading {loading}...")),
            (None, Some(status)) => Some(status.clone()),
            (None, None) => None,
        }
    }
}

pub(super) fn bookmark_label(bookmark: &Bookmark) -> String {
    format!("{} @ {:.0}", bookmark.name, bookmark.position)
}

pub(super) fn line_color(kind: SpeakerRole, focused: bool) -> Color {
    let base = match kind {
        SpeakerRole::Direction => Color::from_rgb(0.62, 0.62, 0.62),
        SpeakerRole::SpeakerA => Color::from_rgb(0.55, 0.78, 1.0),
        SpeakerRole::SpeakerB => Color::from_rgb(1.0, 0.78, 0.45),
    };
    if focused { base } else { Color { a: 0.45, ..base } }
}
