pub(crate) fn default_script() -> String {
    prompter_core::session::DEFAULT_SCRIPT_SOURCE.to_string()
}

pub(crate) fn default_available_scripts() -> Vec<String> {
    vec!["script.json".to_string(), "episode1.json".to_string()]
}

pub(crate) fn default_speed_step() -> f64 {
    0.05
}

pub(crate) fn default_font_size() -> f32 {
    28.0
}

/// 28px type at 1.6 line height.
pub(crate) fn default_line_height() -> f64 {
    44.8
}

pub(crate) fn default_window_width() -> f32 {
    1280.0
}

pub(crate) fn default_window_height() -> f32 {
    900.0
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}

pub(crate) fn default_key_toggle_play_pause() -> String {
    "space".to_string()
}

pub(crate) fn default_key_speed_up() -> String {
    "+".to_string()
}

pub(crate) fn default_key_speed_down() -> String {
    "-".to_string()
}

pub(crate) fn default_key_rewind() -> String {
    "r".to_string()
}

pub(crate) fn default_key_add_bookmark() -> String {
    "b".to_string()
}

pub(crate) fn default_key_go_home() -> String {
    "h".to_string()
}

pub(crate) fn default_key_quit() -> String {
    "q".to_string()
}
