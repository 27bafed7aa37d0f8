//! Captured error payload and its rendered text form.

use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

/// An error caught at a capture boundary.
///
/// The capture scope never inspects `kind` beyond printing it; any error
/// the host raises maps onto these four strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    /// Short type name of the error, e.g. `ParseIntError` or `Panic`.
    pub kind: String,
    pub message: String,
    /// `source()` chain, direct cause first.
    pub causes: Vec<String>,
    /// Stack trace text as `std::backtrace::Backtrace` displays it.
    pub trace: String,
}

impl CapturedError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            causes: Vec::new(),
            trace: String::new(),
        }
    }

    pub fn with_causes(mut self, causes: Vec<String>) -> Self {
        self.causes = causes;
        self
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }

    /// Capture a concrete error at the current call site.
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        Self::new(short_type_name(std::any::type_name::<E>()), err.to_string())
            .with_causes(source_chain(err))
            .with_trace(Backtrace::force_capture().to_string())
    }

    /// Render the multi-line record text. Always ends with a newline and
    /// the last line is always `Kind: message`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "stack backtrace:")?;
        let trace = self.trace.trim_end_matches('\n');
        if trace.is_empty() {
            writeln!(f, "<no frames captured>")?;
        } else {
            writeln!(f, "{trace}")?;
        }
        for cause in self.causes.iter().rev() {
            writeln!(f, "caused by: {cause}")?;
        }
        writeln!(f, "{}: {}", self.kind, self.message)
    }
}

/// `a::b::Thing<c::D>` -> `Thing`.
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Display strings of `err.source()` and onward, direct cause first.
pub fn source_chain(err: &(dyn Error + 'static)) -> Vec<String> {
    let mut causes = Vec::new();
    let mut next = err.source();
    while let Some(cause) = next {
        causes.push(cause.to_string());
        next = cause.source();
    }
    causes
}
