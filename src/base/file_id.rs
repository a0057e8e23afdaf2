//! Compact file identifiers.

/// Identifies a source file registered with a workspace.
///
/// Uses u32 for compact storage; the workspace owns the mapping from
/// `FileId` to path and text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new FileId from an index.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file#{}", self.0)
    }
}
