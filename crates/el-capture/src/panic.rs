//! Panic capture.
//!
//! A panic's payload reaches `catch_unwind`, but its stack trace does
//! not. The hook installed here snapshots the message, location and
//! backtrace at the panic site into thread-local storage, where the
//! capture scope picks them up while unwinding. Panics on a thread with
//! no active scope are passed straight to the previous hook.

use el_core::CapturedError;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::sync::Once;

pub const PANIC_KIND: &str = "Panic";

/// Message used when the payload is neither `&str` nor `String`.
const OPAQUE_PAYLOAD: &str = "Box<dyn Any>";

#[derive(Debug)]
struct PanicSite {
    message: String,
    location: Option<String>,
    trace: String,
}

thread_local! {
    /// Most recent panic on this thread, written by the hook.
    static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };

    /// Number of capture scopes currently entered on this thread.
    static SCOPE_DEPTH: Cell<usize> = const { Cell::new(0) };
}

static HOOK: Once = Once::new();

/// Chain a hook in front of the current panic hook that remembers where
/// each panic happened. Idempotent. The previous hook still runs, so
/// panic output is unchanged.
pub fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if scope_depth() == 0 {
                previous(info);
                return;
            }
            let site = PanicSite {
                message: payload_message(info.payload()),
                location: info.location().map(|l| l.to_string()),
                trace: Backtrace::force_capture().to_string(),
            };
            let _ = LAST_PANIC.try_with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = Some(site);
                }
            });
            previous(info);
        }));
    });
}

fn scope_depth() -> usize {
    SCOPE_DEPTH.try_with(Cell::get).unwrap_or(0)
}

/// Called when a scope is entered. Drops any site left by an earlier
/// panic so only panics raised inside this scope are attributed to it.
pub(crate) fn scope_entered() {
    let _ = take_site();
    let _ = SCOPE_DEPTH.try_with(|depth| depth.set(depth.get() + 1));
}

pub(crate) fn scope_left() {
    let _ = SCOPE_DEPTH.try_with(|depth| depth.set(depth.get().saturating_sub(1)));
}

fn take_site() -> Option<PanicSite> {
    LAST_PANIC
        .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut s| s.take()))
        .ok()
        .flatten()
}

pub(crate) fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        OPAQUE_PAYLOAD.to_string()
    }
}

fn site_trace(site: &PanicSite) -> String {
    match &site.location {
        Some(location) => format!("panicked at {location}\n{}", site.trace),
        None => site.trace.clone(),
    }
}

/// Build the record for a panic caught by `catch_unwind`.
pub(crate) fn captured_from_payload(payload: &(dyn Any + Send)) -> CapturedError {
    let message = payload_message(payload);
    let trace = match take_site() {
        Some(site) if site.message == message => site_trace(&site),
        _ => Backtrace::force_capture().to_string(),
    };
    CapturedError::new(PANIC_KIND, message).with_trace(trace)
}

/// Build the record for a panic seen only as `thread::panicking()`,
/// with no payload in hand.
pub(crate) fn captured_from_unwind() -> CapturedError {
    match take_site() {
        Some(site) => {
            let trace = site_trace(&site);
            CapturedError::new(PANIC_KIND, site.message).with_trace(trace)
        }
        None => CapturedError::new(PANIC_KIND, "panicked inside capture scope")
            .with_trace(Backtrace::force_capture().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::catch_unwind;

    #[test]
    fn payload_messages() {
        let boxed: Box<dyn Any + Send> = Box::new("static text");
        assert_eq!(payload_message(boxed.as_ref()), "static text");
        let boxed: Box<dyn Any + Send> = Box::new(format!("formatted {}", 7));
        assert_eq!(payload_message(boxed.as_ref()), "formatted 7");
        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(payload_message(boxed.as_ref()), "Box<dyn Any>");
    }

    #[test]
    fn hook_records_panic_site() {
        install_panic_hook();
        install_panic_hook();

        scope_entered();
        let payload = catch_unwind(|| panic!("hooked {}", "panic")).unwrap_err();
        scope_left();
        let captured = captured_from_payload(payload.as_ref());
        assert_eq!(captured.kind, "Panic");
        assert_eq!(captured.message, "hooked panic");
        assert!(captured.trace.starts_with("panicked at "));
        assert!(captured.trace.contains("panic.rs"));

        // The site is consumed once read.
        assert!(take_site().is_none());
    }

    #[test]
    fn panic_outside_scope_is_not_snapshotted() {
        install_panic_hook();

        let _ = catch_unwind(|| panic!("nobody is watching"));
        assert!(take_site().is_none());
        assert_eq!(scope_depth(), 0);
    }

    #[test]
    fn entering_clears_stale_site() {
        install_panic_hook();

        scope_entered();
        let _ = catch_unwind(|| panic!("caught inside the first scope"));
        scope_left();

        scope_entered();
        assert!(take_site().is_none());
        scope_left();
    }

    #[test]
    fn unwind_without_site_still_records() {
        let captured = captured_from_unwind();
        assert_eq!(captured.kind, "Panic");
        assert_eq!(captured.message, "panicked inside capture scope");
        assert!(captured.render().ends_with("Panic: panicked inside capture scope\n"));
    }
}
