use serde::Deserialize;

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_script")]
    pub default_script: String,
    #[serde(default = "crate::config::defaults::default_available_scripts")]
    pub available_scripts: Vec<String>,
    #[serde(default = "crate::config::defaults::default_speed_step")]
    pub speed_step: f64,
    #[serde(default = "crate::config::defaults::default_font_size")]
    pub font_size: f32,
    #[serde(default = "crate::config::defaults::default_line_height")]
    pub line_height: f64,
    #[serde(default = "crate::config::defaults::default_window_width")]
    pub window_width: f32,
    #[serde(default = "crate::config::defaults::default_window_height")]
    pub window_height: f32,
    #[serde(default = "crate::config::defaults::default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default = "crate::config::defaults::default_key_toggle_play_pause")]
    pub key_toggle_play_pause: String,
    #[serde(default = "crate::config::defaults::default_key_speed_up")]
    pub key_speed_up: String,
    #[serde(default = "crate::config::defaults::default_key_speed_down")]
    pub key_speed_down: String,
    #[serde(default = "crate::config::defaults::default_key_rewind")]
    pub key_rewind: String,
    #[serde(default = "crate::config::defaults::default_key_add_bookmark")]
    pub key_add_bookmark: String,
    #[serde(default = "crate::config::defaults::default_key_go_home")]
    pub key_go_home: String,
    #[serde(default = "crate::config::defaults::default_key_quit")]
    pub key_quit: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            default_script: crate::config::defaults::default_script(),
            available_scripts: crate::config::defaults::default_available_scripts(),
            speed_step: crate::config::defaults::default_speed_step(),
            font_size: crate::config::defaults::default_font_size(),
            line_height: crate::config::defaults::default_line_height(),
            window_width: crate::config::defaults::default_window_width(),
            window_height: crate::config::defaults::default_window_height(),
            cache_dir: crate::config::defaults::default_cache_dir(),
            log_level: crate::config::defaults::default_log_level(),
            key_toggle_play_pause: crate::config::defaults::default_key_toggle_play_pause(),
            key_speed_up: crate::config::defaults::default_key_speed_up(),
            key_speed_down: crate::config::defaults::default_key_speed_down(),
            key_rewind: crate::config::defaults::default_key_rewind(),
            key_add_bookmark: crate::config::defaults::default_key_add_bookmark(),
            key_go_home: crate::config::defaults::default_key_go_home(),
            key_quit: crate::config::defaults::default_key_quit(),
        }
    }
}

impl AppConfig {
    /// Keep layout values usable regardless of what the file said.
    pub fn sanitized(mut self) -> Self {
        if !(self.speed_step.is_finite() && self.speed_step > 0.0) {
            self.speed_step = crate::config::defaults::default_speed_step();
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            self.font_size = crate::config::defaults::default_font_size();
        }
        // Rows never overlap their glyphs.
        if !(self.line_height.is_finite() && self.line_height >= f64::from(self.font_size)) {
            self.line_height = crate::config::defaults::default_line_height()
                .max(f64::from(self.font_size));
        }
        if !(self.window_width.is_finite() && self.window_width > 0.0) {
            self.window_width = crate::config::defaults::default_window_width();
        }
        if !(self.window_height.is_finite() && self.window_height > 0.0) {
            self.window_height = crate::config::defaults::default_window_height();
        }
        self
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
