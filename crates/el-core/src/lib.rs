//! el-core: Shared types for errorlogger
//!
//! This crate has zero internal crate dependencies and defines the
//! types the sink and capture crates agree on.

pub mod context;
pub mod record;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use context::{CaptureContext, SinkKind};
pub use record::CapturedError;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store error on {}: {message}", path.display())]
    Store { path: PathBuf, message: String },
}

impl SinkError {
    /// Target the failed write was aimed at.
    pub fn path(&self) -> &Path {
        match self {
            SinkError::Io { path, .. } | SinkError::Store { path, .. } => path,
        }
    }
}

/// Durable destination for rendered error text.
///
/// Implementations are stateless with respect to `target`: every call
/// opens, writes and releases its own handle.
pub trait Sink: Send + Sync {
    fn record(&self, target: &Path, text: &str) -> Result<(), SinkError>;
}
