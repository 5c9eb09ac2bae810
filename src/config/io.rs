use super::models::AppConfig;
use super::tables::{ConfigTables, TABLE_NAMES};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load the config from disk, falling back to defaults on any failure.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            AppConfig::default()
        }
    }
}

/// Parse either the grouped table layout or the flat key layout.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let raw: toml::Table = toml::from_str(contents).context("config is not valid TOML")?;
    let grouped = raw
        .iter()
        .any(|(key, value)| value.is_table() && TABLE_NAMES.contains(&key.as_str()));

    let config = if grouped {
        let tables: ConfigTables = toml::from_str(contents).context("invalid config tables")?;
        AppConfig::from(tables)
    } else {
        toml::from_str::<AppConfig>(contents).context("invalid config values")?
    };
    Ok(config.sanitized())
}

/// Render the config in the grouped table layout.
pub fn serialize_config(config: &AppConfig) -> Result<String> {
    let tables = ConfigTables::from(config);
    toml::to_string(&tables).context("Failed to serialize config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse_config("").expect("empty config parses");
        assert_eq!(cfg.default_script, "script.json");
        assert!((cfg.font_size - 28.0).abs() < 1e-6);
        assert_eq!(cfg.key_toggle_play_pause, "space");
        assert_eq!(cfg.log_level, LogLevel::Debug);
    }

    #[test]
    fn flat_layout_is_accepted() {
        let cfg = parse_config(
            r#"
default_script = "episode1.json"
speed_step = 0.1
log_level = "warn"
key_quit = "x"
"#,
        )
        .expect("flat config parses");
        assert_eq!(cfg.default_script, "episode1.json");
        assert!((cfg.speed_step - 0.1).abs() < 1e-12);
        assert_eq!(cfg.log_level, LogLevel::Warn);
        assert_eq!(cfg.key_quit, "x");
        assert_eq!(cfg.key_rewind, "r");
    }

    #[test]
    fn table_layout_is_accepted() {
        let cfg = parse_config(
            r#"
[playback]
speed_step = 0.1

[layout]
font_size = 16.0
line_height = 20.0

[keys]
go_home = "escape"

[logging]
log_level = "info"
"#,
        )
        .expect("table config parses");
        assert!((cfg.speed_step - 0.1).abs() < 1e-12);
        assert!((cfg.font_size - 16.0).abs() < 1e-6);
        assert!((cfg.line_height - 20.0).abs() < 1e-12);
        assert_eq!(cfg.key_go_home, "escape");
        assert_eq!(cfg.log_level, LogLevel::Info);
        assert_eq!(cfg.cache_dir, ".cache");
    }

    #[test]
    fn unusable_numbers_are_replaced() {
        let cfg = parse_config(
            r#"
speed_step = -1.0
window_height = 0.0
font_size = 40.0
line_height = 30.0
"#,
        )
        .expect("config parses");
        assert!((cfg.speed_step - 0.05).abs() < 1e-12);
        assert!((cfg.window_height - 900.0).abs() < 1e-6);
        assert!((cfg.line_height - 44.8).abs() < 1e-12);
    }

    #[test]
    fn invalid_toml_is_an_error_and_load_falls_back() {
        assert!(parse_config("speed_step = [").is_err());

        let path = std::env::temp_dir().join(format!(
            "prompter-config-{}-invalid.toml",
            std::process::id()
        ));
        fs::write(&path, "log_level = 12").expect("write config");
        let cfg = load_config(&path);
        assert_eq!(cfg.log_level, LogLevel::Debug);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut cfg = AppConfig::default();
        cfg.key_add_bookmark = "m".to_string();
        cfg.available_scripts = vec!["a.json".to_string()];
        let text = serialize_config(&cfg).expect("serialize");
        assert!(text.contains("[keys]"));
        let parsed = parse_config(&text).expect("parse back");
        assert_eq!(parsed.key_add_bookmark, "m");
        assert_eq!(parsed.available_scripts, vec!["a.json".to_string()]);
    }
}
