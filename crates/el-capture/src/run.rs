//! Closure form of a capture scope: enter, run, exit in one call.
//!
//! Every helper returns exactly what the closure produced. An `Err` is
//! recorded and handed back; a panic is recorded and resumed with its
//! original payload.

use crate::panic;
use crate::scope::ScopedCapture;
use el_core::{CaptureContext, CapturedError};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};

/// Kind recorded for `anyhow::Error`, whose concrete type is erased.
pub const ANYHOW_KIND: &str = "Error";

impl ScopedCapture {
    /// Run `f`, recording its `Err`. A panic inside `f` is recorded by the
    /// scope's drop guard and keeps unwinding.
    pub fn run<T, E, F>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(&CaptureContext) -> Result<T, E>,
        E: Error + 'static,
    {
        let scope = self.enter();
        let result = f(scope.context());
        let captured = result.as_ref().err().map(CapturedError::from_error);
        scope.exit(captured.as_ref());
        result
    }

    /// `run` for `anyhow::Result`.
    pub fn run_anyhow<T, F>(self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&CaptureContext) -> anyhow::Result<T>,
    {
        let scope = self.enter();
        let result = f(scope.context());
        let captured = result.as_ref().err().map(captured_from_anyhow);
        scope.exit(captured.as_ref());
        result
    }

    /// Run infallible code, recording a panic before resuming it.
    pub fn run_unwinding<T, F>(self, f: F) -> T
    where
        F: FnOnce(&CaptureContext) -> T,
    {
        let scope = self.enter();
        match catch_unwind(AssertUnwindSafe(|| f(scope.context()))) {
            Ok(value) => {
                scope.exit(None);
                value
            }
            Err(payload) => {
                let captured = panic::captured_from_payload(payload.as_ref());
                scope.exit(Some(&captured));
                resume_unwind(payload)
            }
        }
    }
}

/// anyhow keeps its own backtrace when `RUST_BACKTRACE` enables it;
/// otherwise one is taken here.
pub fn captured_from_anyhow(err: &anyhow::Error) -> CapturedError {
    let trace = match err.backtrace().status() {
        BacktraceStatus::Captured => err.backtrace().to_string(),
        _ => Backtrace::force_capture().to_string(),
    };
    let causes = err.chain().skip(1).map(ToString::to_string).collect();
    CapturedError::new(ANYHOW_KIND, err.to_string())
        .with_causes(causes)
        .with_trace(trace)
}
