//! el-sink: Durable sinks for captured error text.

pub mod file;
pub mod store;

use el_core::{Sink, SinkKind};

pub use file::FileSink;
pub use store::StoreSink;

/// Fixed kind-to-sink mapping.
pub fn sink_for(kind: SinkKind) -> &'static dyn Sink {
    static FILE: FileSink = FileSink;
    static STORE: StoreSink = StoreSink;
    match kind {
        SinkKind::Store => &STORE,
        SinkKind::File => &FILE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_by_kind() {
        let dir = tempfile::tempdir().unwrap();

        let txt = dir.path().join("error.txt");
        sink_for(SinkKind::File).record(&txt, "Kind: text\n").unwrap();
        assert!(std::fs::read_to_string(&txt).unwrap().ends_with("Kind: text\n"));

        let db = dir.path().join("error.db");
        sink_for(SinkKind::from("sqlite")).record(&db, "Kind: row\n").unwrap();
        let conn = rusqlite::Connection::open(&db).unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM logs", [], |r| r.get(0)).unwrap();
        assert_eq!(n, 1);

        // Unknown kinds never reach the store
        let other = dir.path().join("fallback.log");
        sink_for(SinkKind::from("mystery")).record(&other, "Kind: text\n").unwrap();
        assert!(other.exists());
    }
}
