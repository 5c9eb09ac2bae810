use serde::{Deserialize, Serialize};

/// A named scroll position. Not tied to any particular script.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    pub id: String,
    pub name: String,
    pub position: f64,
}

impl Bookmark {
    /// Numeric form of the id when it is a creation timestamp.
    pub(crate) fn timestamp(&self) -> Option<u64> {
        self.id.parse().ok()
    }
}
