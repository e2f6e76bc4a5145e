//! Platform directory readers.
//!
//! A reader returns every entry of one directory in a single call:
//! `(name, is_dir, size_bytes, disk_usage)`. Symbolic links are never
//! followed; `is_dir` reflects the entry's own type, so a symlink to a
//! directory reads as a file. `.` and `..` are skipped.
//!
//! Unreadable directories and unstattable entries are counted, not raised:
//! they are expected on any sufficiently large tree.

use std::fs;

use compact_str::CompactString;

/// One directory entry as returned by a platform reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Basename of the entry.
    pub name: CompactString,
    /// True for directories (never for symlinks).
    pub is_dir: bool,
    /// Logical size; 0 for directories.
    pub size_bytes: u64,
    /// Allocated size; 0 for directories.
    pub disk_usage: u64,
}

/// Result of reading one directory.
#[derive(Debug, Default)]
pub struct DirRead {
    /// Entries collected, `.`/`..` excluded.
    pub entries: Vec<RawEntry>,
    /// Open/readdir/stat failures encountered.
    pub errors: u64,
}

impl DirRead {
    /// A failed open: no entries, one error.
    pub fn failed_open() -> Self {
        Self {
            entries: Vec::new(),
            errors: 1,
        }
    }
}

/// A single-directory scanner backend.
pub trait DirectoryReader: Send + Sync {
    /// Read all entries of `path`.
    fn read_dir(&self, path: &str) -> DirRead;

    /// Short backend name for logging.
    fn name(&self) -> &'static str;
}

/// Portable reader built on [`std::fs::read_dir`] and each entry's cached
/// non-following metadata. The preferred variant wherever raw syscall
/// batching is unavailable; Rust has no runtime lock to release, so this
/// already overlaps I/O across workers.
#[derive(Debug, Default)]
pub struct PureReader;

impl PureReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }
}

impl DirectoryReader for PureReader {
    fn read_dir(&self, path: &str) -> DirRead {
        let iter = match fs::read_dir(path) {
            Ok(iter) => iter,
            Err(_) => return DirRead::failed_open(),
        };

        let mut out = DirRead::default();
        for item in iter {
            let entry = match item {
                Ok(entry) => entry,
                Err(_) => {
                    out.errors += 1;
                    continue;
                }
            };
            // DirEntry::metadata does not traverse symlinks.
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(_) => {
                    out.errors += 1;
                    continue;
                }
            };

            let name = CompactString::from(entry.file_name().to_string_lossy().as_ref());
            let is_dir = meta.is_dir();
            let (size_bytes, disk_usage) = if is_dir {
                (0, 0)
            } else {
                (meta.len(), allocated_bytes(&meta))
            };
            out.entries.push(RawEntry {
                name,
                is_dir,
                size_bytes,
                disk_usage,
            });
        }
        out
    }

    fn name(&self) -> &'static str {
        "pure"
    }
}

/// Allocated bytes for a file: `st_blocks * 512` where available.
#[cfg(unix)]
pub(crate) fn allocated_bytes(meta: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.blocks() * 512
}

/// Fallback estimate: logical size rounded up to 512-byte blocks.
#[cfg(not(unix))]
pub(crate) fn allocated_bytes(meta: &fs::Metadata) -> u64 {
    meta.len().div_ceil(512) * 512
}

/// Select the fastest reader for the current platform.
///
/// macOS gets the `getattrlistbulk` batch reader (name, type and sizes in
/// one syscall per batch); other unixes get `readdir` + `lstat`; everything
/// else gets the portable reader.
pub fn default_reader() -> Box<dyn DirectoryReader> {
    #[cfg(target_os = "macos")]
    return Box::new(crate::bulk::BulkReader::new());

    #[cfg(all(unix, not(target_os = "macos")))]
    return Box::new(crate::readdir::ReaddirReader::new());

    #[cfg(not(unix))]
    return Box::new(PureReader::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_pure_reader_collects_entries() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        let mut f = File::create(temp.path().join("data.bin")).unwrap();
        f.write_all(&[0u8; 1000]).unwrap();

        let read = PureReader::new().read_dir(temp.path().to_str().unwrap());
        assert_eq!(read.errors, 0);
        assert_eq!(read.entries.len(), 2);

        let file = read.entries.iter().find(|e| e.name == "data.bin").unwrap();
        assert!(!file.is_dir);
        assert_eq!(file.size_bytes, 1000);

        let dir = read.entries.iter().find(|e| e.name == "sub").unwrap();
        assert!(dir.is_dir);
        assert_eq!(dir.size_bytes, 0);
        assert_eq!(dir.disk_usage, 0);
    }

    #[test]
    fn test_pure_reader_open_failure_counts_one_error() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("plain.txt");
        File::create(&file_path).unwrap();

        // Opening a regular file as a directory fails.
        let read = PureReader::new().read_dir(file_path.to_str().unwrap());
        assert_eq!(read.errors, 1);
        assert!(read.entries.is_empty());

        let missing = PureReader::new().read_dir("/no/such/directory/anywhere");
        assert_eq!(missing.errors, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_pure_reader_treats_symlinked_dir_as_file() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("real")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("link")).unwrap();

        let read = PureReader::new().read_dir(temp.path().to_str().unwrap());
        let link = read.entries.iter().find(|e| e.name == "link").unwrap();
        assert!(!link.is_dir);
    }
}
