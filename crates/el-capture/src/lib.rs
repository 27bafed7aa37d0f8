//! el-capture: Scoped error capture.
//!
//! Code runs inside a guarded scope. If an error leaves the scope (an
//! `Err` or a panic), its kind, message, cause chain and stack trace are
//! recorded to a file or SQLite sink, then the error continues to the
//! caller untouched. A scope that finishes cleanly records nothing.
//!
//! ```no_run
//! use el_capture::ScopedCapture;
//!
//! fn parse(input: &str) -> Result<i32, std::num::ParseIntError> {
//!     // dump to file
//!     ScopedCapture::file("error.txt").run(|_| input.parse::<i32>())
//! }
//!
//! fn divide(a: i32, b: i32) -> i32 {
//!     // dump to sqlite; the panic still unwinds out of `divide`
//!     ScopedCapture::new("error.db", "sqlite").run_unwinding(|_| a / b)
//! }
//! ```

pub mod panic;
pub mod run;
pub mod scope;

pub use el_core::{CaptureContext, CapturedError, Sink, SinkError, SinkKind};
pub use el_sink::{sink_for, FileSink, StoreSink};
pub use panic::install_panic_hook;
pub use scope::{ActiveCapture, ExitSignal, ScopedCapture};
