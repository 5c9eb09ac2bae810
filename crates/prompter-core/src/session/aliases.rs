use crate::script::Speaker;
use std::collections::BTreeMap;

/// Display names for each speaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerAliases {
    names: BTreeMap<Speaker, String>,
}

impl Default for SpeakerAliases {
    fn default() -> Self {
        Self {
            names: Speaker::ALL
                .iter()
                .map(|speaker| (*speaker, speaker.default_name().to_string()))
                .collect(),
        }
    }
}

impl SpeakerAliases {
    /// Stored alias, possibly empty.
    pub fn get(&self, speaker: Speaker) -> &str {
        self.names
            .get(&speaker)
            .map(String::as_str)
            .unwrap_or_else(|| speaker.default_name())
    }

    pub fn set(&mut self, speaker: Speaker, alias: impl Into<String>) {
        self.names.insert(speaker, alias.into());
    }

    /// Name to print for a speaker; blank aliases fall back to the default.
    pub fn label(&self, speaker: Speaker) -> &str {
        let alias = self.get(speaker).trim();
        if alias.is_empty() {
            speaker.default_name()
        } else {
            alias
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let map: BTreeMap<&str, &str> = Speaker::ALL
            .iter()
            .map(|speaker| (speaker.key(), self.get(*speaker)))
            .collect();
        serde_json::to_string(&map)
    }

    /// Parse a stored alias object. Unknown keys are ignored, missing roles
    /// keep their defaults, and canonical keys win over legacy ones.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let stored: BTreeMap<String, String> = serde_json::from_str(raw)?;
        let mut aliases = Self::default();
        let (canonical, legacy): (Vec<_>, Vec<_>) = stored
            .iter()
            .filter_map(|(key, value)| Speaker::from_token(key).map(|s| (key, s, value)))
            .partition(|(key, speaker, _)| key.as_str() == speaker.key());
        for (_, speaker, value) in legacy.into_iter().chain(canonical) {
            aliases.set(speaker, value.clone());
        }
        Ok(aliases)
    }
}
