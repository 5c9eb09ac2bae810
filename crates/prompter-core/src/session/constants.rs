/// Limits and defaults for playback controls.
pub const MIN_SPEED: f64 = 0.05;
pub const MAX_SPEED: f64 = 1.0;
pub const DEFAULT_SPEED: f64 = 0.35;
pub const DEFAULT_SCRIPT_SOURCE: &str = "script.json";
