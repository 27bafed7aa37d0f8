//! Capture scope: enter, run the guarded code, exit.

use crate::panic;
use el_core::{CaptureContext, CapturedError, SinkError, SinkKind};
use std::path::PathBuf;

/// What `exit` tells the caller about the escaping error.
///
/// Neither variant suppresses anything: capture is observational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSignal {
    /// No error left the scope; nothing was recorded.
    Clean,
    /// An error left the scope and must keep propagating.
    Propagate,
}

/// A capture scope that has not been entered yet.
#[derive(Debug, Clone)]
pub struct ScopedCapture {
    context: CaptureContext,
}

impl ScopedCapture {
    /// `sink_kind` accepts `SinkKind` or a name (`"file"`, `"store"`,
    /// `"sqlite"`); unknown names select the file sink.
    pub fn new(target: impl Into<PathBuf>, sink_kind: impl Into<SinkKind>) -> Self {
        Self::from_context(CaptureContext::new(target, sink_kind))
    }

    pub fn file(target: impl Into<PathBuf>) -> Self {
        Self::new(target, SinkKind::File)
    }

    pub fn store(target: impl Into<PathBuf>) -> Self {
        Self::new(target, SinkKind::Store)
    }

    pub fn from_context(context: CaptureContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &CaptureContext {
        &self.context
    }

    /// Start the guarded scope. Performs no I/O.
    pub fn enter(self) -> ActiveCapture {
        panic::install_panic_hook();
        panic::scope_entered();
        ActiveCapture {
            context: self.context,
            exited: false,
        }
    }
}

/// An entered scope. Consumed by `exit`.
///
/// Dropped without `exit` while the thread is panicking, it records the
/// panic itself.
#[must_use = "an active capture records nothing unless it is exited or unwound"]
#[derive(Debug)]
pub struct ActiveCapture {
    context: CaptureContext,
    exited: bool,
}

impl ActiveCapture {
    pub fn context(&self) -> &CaptureContext {
        &self.context
    }

    /// Leave the scope. A sink failure is logged and never replaces the
    /// escaping error.
    pub fn exit(self, error: Option<&CapturedError>) -> ExitSignal {
        let target = self.context.target().to_path_buf();
        match self.try_exit(error) {
            Ok(signal) => signal,
            Err(e) => {
                tracing::error!(
                    path = %target.display(),
                    error = %e,
                    "failed to record captured error"
                );
                ExitSignal::Propagate
            }
        }
    }

    /// Leave the scope, surfacing a sink failure to the caller.
    pub fn try_exit(mut self, error: Option<&CapturedError>) -> Result<ExitSignal, SinkError> {
        self.exited = true;
        match error {
            None => Ok(ExitSignal::Clean),
            Some(captured) => {
                record(&self.context, captured)?;
                Ok(ExitSignal::Propagate)
            }
        }
    }
}

impl Drop for ActiveCapture {
    fn drop(&mut self) {
        if !self.exited && std::thread::panicking() {
            self.record_unwind();
        }
        panic::scope_left();
    }
}

impl ActiveCapture {
    fn record_unwind(&self) {
        let captured = panic::captured_from_unwind();
        tracing::warn!(
            path = %self.context.target().display(),
            panic = %captured.message,
            "capture scope unwound by panic"
        );
        if let Err(e) = record(&self.context, &captured) {
            tracing::error!(error = %e, "failed to record panic");
        }
    }
}

fn record(context: &CaptureContext, captured: &CapturedError) -> Result<(), SinkError> {
    tracing::debug!(
        path = %context.target().display(),
        sink = %context.sink_kind(),
        kind = %captured.kind,
        "recording captured error"
    );
    el_sink::sink_for(context.sink_kind()).record(context.target(), &captured.render())
}
