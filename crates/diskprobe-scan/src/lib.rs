//! File system scanning engine for diskprobe.
//!
//! A work-queue-driven pool of scan workers fans out across directories,
//! reading each one through the fastest platform primitive available:
//!
//! - **bulk** (macOS) — `getattrlistbulk` returns name, type and both sizes
//!   for a whole batch of entries in one syscall.
//! - **readdir** (other unixes) — `opendir`/`readdir` plus `lstat`.
//! - **pure** (everywhere) — `std::fs::read_dir` with cached metadata.
//!
//! The resulting tree is finalized bottom-up before being returned, so
//! every directory carries aggregated sizes and size-sorted children.
//!
//! ```rust,no_run
//! use diskprobe_core::ScanConfig;
//! use diskprobe_scan::scan_path;
//!
//! let snapshot = scan_path(&ScanConfig::new("/var/log")).unwrap();
//! println!("{} files", snapshot.stats.files);
//! ```

#[cfg(target_os = "macos")]
mod bulk;
mod queue;
#[cfg(unix)]
mod readdir;
mod reader;
mod walker;

#[cfg(target_os = "macos")]
pub use bulk::BulkReader;
pub use queue::WorkQueue;
#[cfg(unix)]
pub use readdir::ReaddirReader;
pub use reader::{default_reader, DirRead, DirectoryReader, PureReader, RawEntry};
pub use walker::{scan_path, CancelFn, ProgressFn, Walker};

// Re-export core types for convenience
pub use diskprobe_core::{ScanConfig, ScanError, ScanNode, ScanSnapshot, ScanStats};
