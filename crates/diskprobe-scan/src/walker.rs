//! Threaded directory walker.
//!
//! A fixed pool of workers drains a shared [`WorkQueue`] of directory
//! tasks. Each worker reads one directory through the platform reader,
//! appends child nodes to the task's node, and enqueues subdirectories.
//! Every directory is enqueued at most once and its `children` vector is
//! written by exactly one worker, so per-node state needs no locking; only
//! the global counters are shared, and those are flushed once per
//! directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use compact_str::CompactString;
use tracing::{debug, trace};

use diskprobe_core::{finalize, ScanConfig, ScanError, ScanNode, ScanSnapshot, ScanStats};

use crate::queue::WorkQueue;
use crate::reader::{default_reader, DirRead, DirectoryReader};

/// Progress sink: `(current_path, files_seen, directories_seen)`.
/// Invoked at most about once per hundred entries; implementations must be
/// cheap or hand off to a channel.
pub type ProgressFn<'a> = dyn Fn(&str, u64, u64) + Sync + 'a;

/// Cancel predicate, polled between directories and every ~100 entries.
pub type CancelFn<'a> = dyn Fn() -> bool + Sync + 'a;

/// How many locally processed entries elapse between progress emissions and
/// cancellation polls.
const PROGRESS_INTERVAL: u64 = 100;

/// One unit of work: a directory node awaiting expansion.
struct Task {
    node: *mut ScanNode,
    depth: u32,
}

// SAFETY: a Task's node pointer is dereferenced only by the single worker
// that dequeues it. Pointers are created after the parent directory's
// children vector has fully settled and that vector is never touched again,
// so they stay valid for the whole scan (the root outlives the worker
// scope).
unsafe impl Send for Task {}

/// Shared scan counters. Workers accumulate locally and flush once per
/// directory, so contention is one atomic add per counter per directory.
struct SharedCounters {
    files: AtomicU64,
    directories: AtomicU64,
    access_errors: AtomicU64,
}

impl SharedCounters {
    fn new() -> Self {
        Self {
            files: AtomicU64::new(0),
            // The root is a directory nobody else will count.
            directories: AtomicU64::new(1),
            access_errors: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> ScanStats {
        ScanStats {
            files: self.files.load(Ordering::Relaxed),
            directories: self.directories.load(Ordering::Relaxed),
            access_errors: self.access_errors.load(Ordering::Relaxed),
        }
    }
}

/// Parallel scanner producing a finalized [`ScanSnapshot`].
pub struct Walker {
    reader: Box<dyn DirectoryReader>,
}

impl Walker {
    /// Create a walker with the platform's fastest directory reader.
    pub fn new() -> Self {
        Self {
            reader: default_reader(),
        }
    }

    /// Create a walker with an explicit reader backend.
    pub fn with_reader(reader: Box<dyn DirectoryReader>) -> Self {
        Self { reader }
    }

    /// Scan `config.root` and return the aggregated tree.
    ///
    /// Directory-level read failures and unstattable entries increment
    /// `stats.access_errors` and the walk continues; only an invalid root or
    /// cancellation aborts the scan.
    pub fn scan(
        &self,
        config: &ScanConfig,
        progress: Option<&ProgressFn<'_>>,
        cancel: Option<&CancelFn<'_>>,
    ) -> Result<ScanSnapshot, ScanError> {
        let resolved = resolve_root(&config.root)?;
        let workers = config.effective_workers();
        debug!(
            root = %resolved,
            workers,
            reader = self.reader.name(),
            "scan starting"
        );

        let mut root = ScanNode::new_directory(resolved.clone(), basename(&resolved));
        let queue: WorkQueue<Task> = WorkQueue::new();
        queue.put(Task {
            node: &mut root,
            depth: 0,
        });

        let counters = SharedCounters::new();
        let cancelled = AtomicBool::new(false);

        thread::scope(|s| {
            for _ in 0..workers {
                s.spawn(|| {
                    worker_loop(
                        &queue,
                        self.reader.as_ref(),
                        &counters,
                        &cancelled,
                        progress,
                        cancel,
                        config.max_depth,
                    );
                });
            }
            queue.join();
        });

        if cancelled.load(Ordering::Relaxed) {
            return Err(ScanError::Cancelled {
                path: PathBuf::from(resolved),
            });
        }

        let stats = counters.snapshot();
        finalize(&mut root);
        debug!(
            files = stats.files,
            directories = stats.directories,
            access_errors = stats.access_errors,
            "scan complete"
        );
        Ok(ScanSnapshot { root, stats })
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan with defaults: platform reader, no progress, no cancellation.
pub fn scan_path(config: &ScanConfig) -> Result<ScanSnapshot, ScanError> {
    Walker::new().scan(config, None, None)
}

fn worker_loop(
    queue: &WorkQueue<Task>,
    reader: &dyn DirectoryReader,
    counters: &SharedCounters,
    cancelled: &AtomicBool,
    progress: Option<&ProgressFn<'_>>,
    cancel: Option<&CancelFn<'_>>,
    max_depth: Option<u32>,
) {
    let mut since_progress: u64 = 0;

    while let Some(task) = queue.get() {
        if is_cancelled(cancelled, cancel) {
            // Drain without processing so the queue can complete.
            queue.task_done();
            continue;
        }

        // SAFETY: this worker is the sole owner of the task's node until
        // task_done; see the Send impl on Task.
        let node = unsafe { &mut *task.node };
        let DirRead { entries, errors } = reader.read_dir(&node.path);
        trace!(path = %node.path, entries = entries.len(), "directory read");

        let mut local_files: u64 = 0;
        let mut local_dirs: u64 = 0;
        let needs_sep = !node.path.ends_with('/');
        let mut truncated = false;

        node.children.reserve(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if index != 0
                && index as u64 % PROGRESS_INTERVAL == 0
                && is_cancelled(cancelled, cancel)
            {
                truncated = true;
                break;
            }

            let mut child_path =
                String::with_capacity(node.path.len() + 1 + entry.name.len());
            child_path.push_str(&node.path);
            if needs_sep {
                child_path.push('/');
            }
            child_path.push_str(&entry.name);

            let child = if entry.is_dir {
                local_dirs += 1;
                ScanNode::new_directory(child_path, entry.name)
            } else {
                local_files += 1;
                ScanNode::new_file(child_path, entry.name, entry.size_bytes, entry.disk_usage)
            };
            node.children.push(child);
        }

        // Enqueue subdirectories only once the children vector has settled;
        // later tasks hold pointers into it.
        if !truncated && max_depth.is_none_or(|limit| task.depth < limit) {
            for child in node.children.iter_mut() {
                if child.is_dir() {
                    queue.put(Task {
                        node: child,
                        depth: task.depth + 1,
                    });
                }
            }
        }

        counters.files.fetch_add(local_files, Ordering::Relaxed);
        counters.directories.fetch_add(local_dirs, Ordering::Relaxed);
        counters.access_errors.fetch_add(errors, Ordering::Relaxed);

        since_progress += local_files + local_dirs;
        if since_progress >= PROGRESS_INTERVAL {
            since_progress = 0;
            if let Some(sink) = progress {
                sink(
                    &node.path,
                    counters.files.load(Ordering::Relaxed),
                    counters.directories.load(Ordering::Relaxed),
                );
            }
        }

        queue.task_done();
    }
}

fn is_cancelled(flag: &AtomicBool, cancel: Option<&CancelFn<'_>>) -> bool {
    if flag.load(Ordering::Relaxed) {
        return true;
    }
    if let Some(check) = cancel {
        if check() {
            flag.store(true, Ordering::Relaxed);
            return true;
        }
    }
    false
}

/// Expand a leading `~`, require an existing directory, and absolutize.
fn resolve_root(root: &Path) -> Result<String, ScanError> {
    let expanded = expand_tilde(root);
    let meta =
        std::fs::symlink_metadata(&expanded).map_err(|e| ScanError::io(&expanded, e))?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory { path: expanded });
    }
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::path::absolute(&expanded).map_err(|e| ScanError::io(&expanded, e))?
    };
    Ok(absolute.to_string_lossy().into_owned())
}

fn expand_tilde(path: &Path) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(home) = std::env::var_os("HOME") {
        if text == "~" {
            return PathBuf::from(home);
        }
        if let Some(rest) = text.strip_prefix("~/") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

fn basename(path: &str) -> CompactString {
    match path.rsplit('/').next() {
        Some("") | None => CompactString::from(path),
        Some(name) => CompactString::from(name),
    }
}
