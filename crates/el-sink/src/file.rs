//! Append-only text file sink.
//!
//! Each record is one block:
//!
//! ```text
//! --------------------------------------------------------------------------------
//! YYYY-MM-DD HH:MM:SS
//! <rendered error text>
//! ```

use el_core::{Sink, SinkError};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

pub const SEPARATOR_WIDTH: usize = 80;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================
// Per-target write locks
// ============================================================

lazy_static! {
    static ref TARGET_LOCKS: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>> = Mutex::new(HashMap::new());
}

/// Registry key for `target`. The parent directory is canonicalized
/// rather than the file, so the key is the same before and after the
/// file is created.
fn lock_key(target: &Path) -> PathBuf {
    let canonical = match (target.parent(), target.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
            std::fs::canonicalize(parent).ok().map(|dir| dir.join(name))
        }
        _ => None,
    };
    canonical
        .or_else(|| std::path::absolute(target).ok())
        .unwrap_or_else(|| target.to_path_buf())
}

/// Lock shared by every writer of `target` in this process.
fn lock_for(target: &Path) -> Arc<Mutex<()>> {
    let key = lock_key(target);
    // Entries are only inserted or pruned whole, a poisoned map is still
    // consistent.
    let mut locks = TARGET_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    // Entries held only by the registry have no writer in flight.
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    Arc::clone(locks.entry(key).or_default())
}

/// Format one block. Kept separate so the whole block goes out in a
/// single `write_all`.
pub fn format_block(timestamp: &str, text: &str) -> String {
    let mut block = String::with_capacity(SEPARATOR_WIDTH + timestamp.len() + text.len() + 2);
    block.push_str(&"-".repeat(SEPARATOR_WIDTH));
    block.push('\n');
    block.push_str(timestamp);
    block.push('\n');
    block.push_str(text);
    block
}

/// Appends separator-delimited, timestamped blocks to a text file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSink;

impl Sink for FileSink {
    fn record(&self, target: &Path, text: &str) -> Result<(), SinkError> {
        let io_err = |source: std::io::Error| SinkError::Io {
            path: target.to_path_buf(),
            source,
        };

        let lock = lock_for(target);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(target)
            .map_err(io_err)?;

        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let block = format_block(&timestamp, text);
        file.write_all(block.as_bytes()).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        drop(file);

        tracing::debug!(path = %target.display(), bytes = block.len(), "error block appended");
        Ok(())
    }
}
