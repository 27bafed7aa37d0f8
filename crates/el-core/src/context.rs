//! Capture context: where a scope records to, and how.

use serde::{Deserialize, Deserializer, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// SinkKind
// ---------------------------------------------------------------------------

/// Which sink a scope dispatches to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Append-only text file.
    #[default]
    File,
    /// Local SQLite database.
    Store,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::File => "file",
            SinkKind::Store => "store",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = Infallible;

    /// Never fails: unrecognized names fall back to `File`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "store" | "sqlite" => SinkKind::Store,
            "file" => SinkKind::File,
            _ => SinkKind::File,
        };
        Ok(kind)
    }
}

impl From<&str> for SinkKind {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<String> for SinkKind {
    fn from(s: String) -> Self {
        SinkKind::from(s.as_str())
    }
}

impl<'de> Deserialize<'de> for SinkKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SinkKind::from(raw))
    }
}

// ---------------------------------------------------------------------------
// CaptureContext
// ---------------------------------------------------------------------------

/// Destination of a capture scope. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureContext {
    target: PathBuf,
    #[serde(default)]
    sink_kind: SinkKind,
}

impl CaptureContext {
    pub fn new(target: impl Into<PathBuf>, sink_kind: impl Into<SinkKind>) -> Self {
        Self {
            target: target.into(),
            sink_kind: sink_kind.into(),
        }
    }

    /// File path or database path the sink writes to.
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn sink_kind(&self) -> SinkKind {
        self.sink_kind
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_kinds() {
        assert_eq!(SinkKind::from("file"), SinkKind::File);
        assert_eq!(SinkKind::from("store"), SinkKind::Store);
        assert_eq!(SinkKind::from("sqlite"), SinkKind::Store);
        assert_eq!(SinkKind::from(" SQLite "), SinkKind::Store);
        assert_eq!(SinkKind::from("STORE".to_string()), SinkKind::Store);
    }

    #[test]
    fn unrecognized_kind_falls_back_to_file() {
        assert_eq!(SinkKind::from("bogus"), SinkKind::File);
        assert_eq!(SinkKind::from(""), SinkKind::File);
        assert_eq!(SinkKind::from("postgres"), SinkKind::File);
        assert_eq!(SinkKind::default(), SinkKind::File);
    }

    #[test]
    fn context_from_json_config() {
        let ctx: CaptureContext =
            serde_json::from_str(r#"{"target": "error.db", "sink_kind": "sqlite"}"#).unwrap();
        assert_eq!(ctx.target(), Path::new("error.db"));
        assert_eq!(ctx.sink_kind(), SinkKind::Store);

        // Omitted or unknown kinds both land on the file sink
        let ctx: CaptureContext = serde_json::from_str(r#"{"target": "error.txt"}"#).unwrap();
        assert_eq!(ctx.sink_kind(), SinkKind::File);
        let ctx: CaptureContext =
            serde_json::from_str(r#"{"target": "error.txt", "sink_kind": "syslog"}"#).unwrap();
        assert_eq!(ctx.sink_kind(), SinkKind::File);
    }

    #[test]
    fn context_serializes_canonical_kind() {
        let ctx = CaptureContext::new("error.db", "sqlite");
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["sink_kind"], "store");
        assert_eq!(json["target"], "error.db");
    }
}
