//! File and directory node types.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Type of file system node.
///
/// Symbolic links are never followed during scanning; a symlink shows up as
/// a [`NodeKind::File`] whose sizes describe the link itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Regular file (or anything that is not a directory).
    File,
    /// Directory.
    Directory,
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Check if this is a file.
    pub fn is_file(self) -> bool {
        matches!(self, NodeKind::File)
    }
}

/// A single file or directory in the scanned tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanNode {
    /// Absolute path, `/`-separated.
    pub path: String,

    /// Basename (last path segment).
    pub name: CompactString,

    /// Node type.
    pub kind: NodeKind,

    /// Logical size in bytes (aggregate for directories after finalization).
    pub size_bytes: u64,

    /// Allocated size in bytes: `st_blocks * 512` for files, sum of children
    /// for directories after finalization.
    pub disk_usage: u64,

    /// Children (directories only), sorted by `disk_usage` descending after
    /// finalization. Always empty for files; an empty `Vec` performs no heap
    /// allocation, so million-file trees pay nothing per leaf.
    pub children: Vec<ScanNode>,
}

impl ScanNode {
    /// Create a new file node.
    pub fn new_file(
        path: impl Into<String>,
        name: impl Into<CompactString>,
        size_bytes: u64,
        disk_usage: u64,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind: NodeKind::File,
            size_bytes,
            disk_usage,
            children: Vec::new(),
        }
    }

    /// Create a new directory node with zero sizes.
    pub fn new_directory(path: impl Into<String>, name: impl Into<CompactString>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind: NodeKind::Directory,
            size_bytes: 0,
            disk_usage: 0,
            children: Vec::new(),
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_discrimination() {
        assert!(NodeKind::Directory.is_dir());
        assert!(!NodeKind::Directory.is_file());
        assert!(NodeKind::File.is_file());
        assert!(!NodeKind::File.is_dir());
    }

    #[test]
    fn test_file_node_creation() {
        let node = ScanNode::new_file("/data/test.txt", "test.txt", 1024, 1536);
        assert!(node.is_file());
        assert!(!node.is_dir());
        assert_eq!(node.size_bytes, 1024);
        assert_eq!(node.disk_usage, 1536);
        assert_eq!(node.child_count(), 0);
    }

    #[test]
    fn test_directory_node_creation() {
        let node = ScanNode::new_directory("/data", "data");
        assert!(node.is_dir());
        assert_eq!(node.size_bytes, 0);
        assert_eq!(node.disk_usage, 0);
    }

    #[test]
    fn test_empty_children_do_not_allocate() {
        let node = ScanNode::new_file("/f", "f", 0, 0);
        assert_eq!(node.children.capacity(), 0);
    }
}
