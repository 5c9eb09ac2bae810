//! Display strings for script lines.

use crate::script::ScriptLine;
use crate::session::SpeakerAliases;
use once_cell::sync::Lazy;
use regex::Regex;

// Anything up to the first colon, plus the whitespace after it.
static RE_SPEAKER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^:]*:\s*").unwrap());

/// Strip a leading `Name:` from raw line text.
pub fn strip_speaker_prefix(text: &str) -> &str {
    match RE_SPEAKER_PREFIX.find(text) {
        Some(found) => &text[found.end()..],
        None => text,
    }
}

/// Text as the presenter should read it.
///
/// Speaker lines get the alias label in place of whatever name the script
/// carried; directions are passed through untouched.
pub fn display_text(line: &ScriptLine, aliases: &SpeakerAliases) -> String {
    match line.kind.speaker() {
        Some(speaker) => format!(
            "{}: {}",
            aliases.label(speaker),
            strip_speaker_prefix(&line.text)
        ),
        None => line.text.clone(),
    }
}
