use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Sortable unique id (ULID) used for entry ids and temp file names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Eid(String);

impl Display for Eid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Eid> for String {
    fn from(fr: Eid) -> Self {
        fr.0
    }
}

impl Eid {
    #[inline]
    pub fn new() -> Eid {
        Eid(rusty_ulid::generate_ulid_string())
    }

    /// Entry id in the `e-<ulid>` form.
    pub fn entry_id() -> String {
        format!("e-{}", Eid::new().0.to_lowercase())
    }
}

impl Default for Eid {
    fn default() -> Self {
        Self::new()
    }
}
