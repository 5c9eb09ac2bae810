//! Script model: the ordered dialogue lines a session scrolls through.
//!
//! Scripts travel as a JSON array of `{ "type": <role>, "text": <string> }`
//! objects. Legacy role spellings are folded into the closed role set while
//! deserializing, so nothing downstream ever matches on role strings.

use crate::loader::LoadError;
use serde::{Deserialize, Serialize};

/// File name offered for exported scripts.
pub const EXPORT_FILE_NAME: &str = "script.json";

/// Kind of a script line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SpeakerRole {
    Direction,
    #[serde(alias = "speaker-andreas")]
    SpeakerA,
    #[serde(alias = "speaker-achim")]
    SpeakerB,
}

impl SpeakerRole {
    /// The aliasable speaker behind this role, if it is not a stage direction.
    pub fn speaker(self) -> Option<Speaker> {
        match self {
            SpeakerRole::Direction => None,
            SpeakerRole::SpeakerA => Some(Speaker::A),
            SpeakerRole::SpeakerB => Some(Speaker::B),
        }
    }
}

impl std::fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SpeakerRole::Direction => "direction",
            SpeakerRole::SpeakerA => "speaker-a",
            SpeakerRole::SpeakerB => "speaker-b",
        };
        write!(f, "{}", label)
    }
}

/// Speakers that carry a display alias.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Speaker {
    A,
    B,
}

impl Speaker {
    pub const ALL: [Speaker; 2] = [Speaker::A, Speaker::B];

    pub fn default_name(self) -> &'static str {
        match self {
            Speaker::A => "Andreas",
            Speaker::B => "Achim",
        }
    }

    /// Storage key for this speaker's alias.
    pub fn key(self) -> &'static str {
        match self {
            Speaker::A => "speaker-a",
            Speaker::B => "speaker-b",
        }
    }

    /// Parse a storage or command token, accepting the legacy role names.
    pub fn from_token(token: &str) -> Option<Speaker> {
        match token.trim().to_ascii_lowercase().as_str() {
            "a" | "speaker-a" | "speaker-andreas" => Some(Speaker::A),
            "b" | "speaker-b" | "speaker-achim" => Some(Speaker::B),
            _ => None,
        }
    }
}

/// One line of a loaded script. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptLine {
    #[serde(rename = "type")]
    pub kind: SpeakerRole,
    pub text: String,
}

impl ScriptLine {
    pub fn new(kind: SpeakerRole, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn direction(text: impl Into<String>) -> Self {
        Self::new(SpeakerRole::Direction, text)
    }
}

/// Parse a script document, validating every entry against the role set.
pub fn parse_script(raw: &str) -> Result<Vec<ScriptLine>, LoadError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let serde_json::Value::Array(items) = value else {
        return Err(LoadError::NotASequence);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<ScriptLine>(item).map_err(|err| LoadError::InvalidLine {
                index,
                reason: err.to_string(),
            })
        })
        .collect()
}

/// Serialize lines as a pretty-printed script document.
pub fn export_script(lines: &[ScriptLine]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(lines)
}
