//! Playback core for the prompter: script model, state machine, scroll timing
//! and the small collaborators they lean on (loader, renderer, settings store).

pub mod cancel;
pub mod engine;
pub mod loader;
pub mod progress;
pub mod prompter;
pub mod render;
pub mod script;
pub mod session;
pub mod store;

pub use cancel::CancellationToken;
pub use engine::{Extent, FrameToken, Geometry, ScrollEngine, TickOutcome};
pub use loader::{LoadError, ScriptLoader, SourceLoader, import_script};
pub use progress::progress;
pub use prompter::{Effect, Intent, Notice, Prompter};
pub use render::display_text;
pub use script::{EXPORT_FILE_NAME, ScriptLine, Speaker, SpeakerRole, export_script, parse_script};
pub use session::{Bookmark, Rejection, SessionState, SpeakerAliases};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreKey};
