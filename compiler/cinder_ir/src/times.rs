//! File timestamps captured when a file-backed stream is pushed.

use std::time::SystemTime;

/// Modification/access/change times of a source file, recorded at load
/// time so that later `__TIMESTAMP__`-style expansions agree even if the
/// file changes mid-compilation.
///
/// `changed` falls back to `modified` on platforms without a separate
/// inode-change clock.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FileTimes {
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
    pub changed: Option<SystemTime>,
}

impl FileTimes {
    /// Capture timestamps from filesystem metadata.
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        let modified = meta.modified().ok();
        FileTimes {
            modified,
            accessed: meta.accessed().ok(),
            changed: modified,
        }
    }
}
