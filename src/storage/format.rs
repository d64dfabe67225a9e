//! On-disk session document schema

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::record::RecordEntry;

/// Session file name prefix; the full name is `record-<yyyyMMddHHmmss>.json`
pub const FILE_PREFIX: &str = "record-";

/// Session file extension
pub const FILE_EXT: &str = "json";

/// Current document format version
pub const FORMAT_VERSION: u32 = 1;

/// One persisted session file: the flat recorded entry list plus the
/// asset-name queues.
///
/// Entries are stored in recorded order; correlation keys are not stored
/// since they are derivable from each entry's request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionDocument {
    /// Document format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Recorded exchanges, in the order their responses completed
    #[serde(default)]
    pub entries: Vec<RecordEntry>,
    /// Generated asset names per test name, in generation order
    #[serde(default)]
    pub names: BTreeMap<String, Vec<String>>,
}

fn default_version() -> u32 {
    FORMAT_VERSION
}

impl Default for SessionDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionDocument {
    /// Create an empty document at the current format version
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            entries: Vec::new(),
            names: BTreeMap::new(),
        }
    }

    /// Concatenate another document into this one: entries append in
    /// order, name queues extend per test name
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
        for (test_name, queue) in other.names {
            self.names.entry(test_name).or_default().extend(queue);
        }
    }

    /// Check whether the document holds no entries and no names
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.names.is_empty()
    }
}

/// Check whether `path` names a session file of this format
#[must_use]
pub fn is_session_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    name.starts_with(FILE_PREFIX)
        && path.extension().and_then(|e| e.to_str()) == Some(FILE_EXT)
}
