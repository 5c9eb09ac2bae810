use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::Deserialize;

/// Table names recognized in the grouped layout.
pub(super) const TABLE_NAMES: [&str; 5] = ["playback", "layout", "keys", "storage", "logging"];

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    layout: LayoutConfig,
    #[serde(default)]
    keys: KeysConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            default_script: tables.playback.default_script,
            available_scripts: tables.playback.available_scripts,
            speed_step: tables.playback.speed_step,
            font_size: tables.layout.font_size,
            line_height: tables.layout.line_height,
            window_width: tables.layout.window_width,
            window_height: tables.layout.window_height,
            key_toggle_play_pause: tables.keys.toggle_play_pause,
            key_speed_up: tables.keys.speed_up,
            key_speed_down: tables.keys.speed_down,
            key_rewind: tables.keys.rewind,
            key_add_bookmark: tables.keys.add_bookmark,
            key_go_home: tables.keys.go_home,
            key_quit: tables.keys.quit,
            cache_dir: tables.storage.cache_dir,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            playback: PlaybackConfig {
                default_script: config.default_script.clone(),
                available_scripts: config.available_scripts.clone(),
                speed_step: config.speed_step,
            },
            layout: LayoutConfig {
                font_size: config.font_size,
                line_height: config.line_height,
                window_width: config.window_width,
                window_height: config.window_height,
            },
            keys: KeysConfig {
                toggle_play_pause: config.key_toggle_play_pause.clone(),
                speed_up: config.key_speed_up.clone(),
                speed_down: config.key_speed_down.clone(),
                rewind: config.key_rewind.clone(),
                add_bookmark: config.key_add_bookmark.clone(),
                go_home: config.key_go_home.clone(),
                quit: config.key_quit.clone(),
            },
            storage: StorageConfig {
                cache_dir: config.cache_dir.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_script")]
    default_script: String,
    #[serde(default = "defaults::default_available_scripts")]
    available_scripts: Vec<String>,
    #[serde(default = "defaults::default_speed_step")]
    speed_step: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            default_script: defaults::default_script(),
            available_scripts: defaults::default_available_scripts(),
            speed_step: defaults::default_speed_step(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LayoutConfig {
    #[serde(default = "defaults::default_font_size")]
    font_size: f32,
    #[serde(default = "defaults::default_line_height")]
    line_height: f64,
    #[serde(default = "defaults::default_window_width")]
    window_width: f32,
    #[serde(default = "defaults::default_window_height")]
    window_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            font_size: defaults::default_font_size(),
            line_height: defaults::default_line_height(),
            window_width: defaults::default_window_width(),
            window_height: defaults::default_window_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct KeysConfig {
    #[serde(default = "defaults::default_key_toggle_play_pause")]
    toggle_play_pause: String,
    #[serde(default = "defaults::default_key_speed_up")]
    speed_up: String,
    #[serde(default = "defaults::default_key_speed_down")]
    speed_down: String,
    #[serde(default = "defaults::default_key_rewind")]
    rewind: String,
    #[serde(default = "defaults::default_key_add_bookmark")]
    add_bookmark: String,
    #[serde(default = "defaults::default_key_go_home")]
    go_home: String,
    #[serde(default = "defaults::default_key_quit")]
    quit: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        KeysConfig {
            toggle_play_pause: defaults::default_key_toggle_play_pause(),
            speed_up: defaults::default_key_speed_up(),
            speed_down: defaults::default_key_speed_down(),
            rewind: defaults::default_key_rewind(),
            add_bookmark: defaults::default_key_add_bookmark(),
            go_home: defaults::default_key_go_home(),
            quit: defaults::default_key_quit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            cache_dir: defaults::default_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
