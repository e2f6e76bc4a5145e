//! POSIX directory reader: `opendir`/`readdir` plus one `lstat` per entry.

use std::ffi::{CStr, CString};

use compact_str::CompactString;

use crate::reader::{DirRead, DirectoryReader, RawEntry};

/// Classic POSIX backend. Two syscalls per entry where the portable reader
/// may issue more, and identical symlink semantics (`lstat` never follows).
#[derive(Debug, Default)]
pub struct ReaddirReader;

impl ReaddirReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }
}

impl DirectoryReader for ReaddirReader {
    fn read_dir(&self, path: &str) -> DirRead {
        let dir_path = match CString::new(path) {
            Ok(p) => p,
            Err(_) => return DirRead::failed_open(),
        };

        // SAFETY: dir_path is a valid NUL-terminated string; the stream is
        // closed exactly once below.
        let dirp = unsafe { libc::opendir(dir_path.as_ptr()) };
        if dirp.is_null() {
            return DirRead::failed_open();
        }

        let mut out = DirRead::default();
        loop {
            // SAFETY: dirp is a live DIR stream. A NULL result is treated as
            // end-of-stream, matching opendir-based scanners generally.
            let ep = unsafe { libc::readdir(dirp) };
            if ep.is_null() {
                break;
            }
            // SAFETY: d_name is NUL-terminated within the dirent.
            let name_bytes = unsafe { CStr::from_ptr((*ep).d_name.as_ptr()) }.to_bytes();
            if name_bytes == b"." || name_bytes == b".." {
                continue;
            }

            let mut child = Vec::with_capacity(path.len() + 1 + name_bytes.len());
            child.extend_from_slice(path.as_bytes());
            if !path.ends_with('/') {
                child.push(b'/');
            }
            child.extend_from_slice(name_bytes);
            let child_path = match CString::new(child) {
                Ok(p) => p,
                Err(_) => {
                    out.errors += 1;
                    continue;
                }
            };

            let mut st: libc::stat = unsafe { std::mem::zeroed() };
            // SAFETY: both pointers are valid for the duration of the call.
            if unsafe { libc::lstat(child_path.as_ptr(), &mut st) } < 0 {
                out.errors += 1;
                continue;
            }

            let is_dir = (st.st_mode & libc::S_IFMT) == libc::S_IFDIR;
            let (size_bytes, disk_usage) = if is_dir {
                (0, 0)
            } else {
                (st.st_size as u64, st.st_blocks as u64 * 512)
            };
            out.entries.push(RawEntry {
                name: CompactString::from(String::from_utf8_lossy(name_bytes).as_ref()),
                is_dir,
                size_bytes,
                disk_usage,
            });
        }
        // SAFETY: dirp came from a successful opendir.
        unsafe { libc::closedir(dirp) };
        out
    }

    fn name(&self) -> &'static str {
        "readdir"
    }
}
